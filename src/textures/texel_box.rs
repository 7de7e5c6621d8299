// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::error::Error;

/// A half-open region of texels, `[left, right) x [top, bottom) x [front, back)`.
///
/// The z range addresses depth for [`TextureType::Type3D`](crate::textures::TextureType::Type3D)
/// textures and array slices (or cube faces) for every other type.
///
/// # Examples
///
/// ```
/// use textures_and_passes::textures::TexelBox;
///
/// let region = TexelBox::new(10, 20, 0, 110, 70, 1);
/// assert_eq!(region.width(), 100);
/// assert_eq!(region.height(), 50);
/// assert_eq!(region.depth(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TexelBox {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

impl TexelBox {
    /// Creates a box.
    ///
    /// # Panics
    ///
    /// Panics if `right < left`, `bottom < top` or `back < front`.
    pub fn new(left: u32, top: u32, front: u32, right: u32, bottom: u32, back: u32) -> Self {
        assert!(right >= left, "TexelBox right ({right}) < left ({left})");
        assert!(bottom >= top, "TexelBox bottom ({bottom}) < top ({top})");
        assert!(back >= front, "TexelBox back ({back}) < front ({front})");
        TexelBox {
            left,
            top,
            front,
            right,
            bottom,
            back,
        }
    }

    /// Like [`TexelBox::new`], but reports inverted ranges as an error.
    pub fn try_new(
        left: u32,
        top: u32,
        front: u32,
        right: u32,
        bottom: u32,
        back: u32,
    ) -> Result<Self, Error> {
        if right < left || bottom < top || back < front {
            return Err(Error::invalid_parameters(format!(
                "inverted box ({left},{top},{front})-({right},{bottom},{back})"
            )));
        }
        Ok(TexelBox {
            left,
            top,
            front,
            right,
            bottom,
            back,
        })
    }

    /// A box covering a whole image of the given extent.
    pub fn full(width: u32, height: u32, depth_or_slices: u32) -> Self {
        TexelBox {
            left: 0,
            top: 0,
            front: 0,
            right: width,
            bottom: height,
            back: depth_or_slices,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn depth(&self) -> u32 {
        self.back - self.front
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0 || self.depth() == 0
    }

    /// Whether both boxes have the same width, height and depth.
    pub fn equal_size(&self, other: &TexelBox) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.depth() == other.depth()
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &TexelBox) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.front >= self.front
            && other.right <= self.right
            && other.bottom <= self.bottom
            && other.back <= self.back
    }

    pub fn overlaps(&self, other: &TexelBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
            && self.front < other.back
            && other.front < self.back
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn dimensions_are_differences() {
        for (left, top, right, bottom) in [(0, 0, 0, 0), (3, 4, 10, 4), (1, 1, 256, 512)] {
            let b = TexelBox::new(left, top, 0, right, bottom, 1);
            assert_eq!(b.width(), right - left);
            assert_eq!(b.height(), bottom - top);
        }
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    #[should_panic]
    fn inverted_box_panics() {
        let _ = TexelBox::new(10, 0, 0, 5, 1, 1);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn try_new_reports_inversion() {
        assert!(TexelBox::try_new(0, 5, 0, 1, 4, 1).is_err());
        assert!(TexelBox::try_new(0, 0, 2, 1, 1, 1).is_err());
        assert!(TexelBox::try_new(0, 0, 0, 1, 1, 1).is_ok());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn containment_and_overlap() {
        let outer = TexelBox::full(16, 16, 1);
        let inner = TexelBox::new(4, 4, 0, 8, 8, 1);
        let apart = TexelBox::new(8, 8, 0, 12, 12, 1);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.equal_size(&apart));
        assert!(!inner.overlaps(&apart));
        assert!(outer.overlaps(&apart));
    }
}
