use serde::{Serialize, Deserialize};

/// Shape of one sample flowing through the network, channel-major.
///
/// A flat feature vector of length `n` is represented as `(n, 1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub const fn new(channels: usize, height: usize, width: usize) -> Shape {
        Shape { channels, height, width }
    }

    pub const fn flat(len: usize) -> Shape {
        Shape { channels: len, height: 1, width: 1 }
    }

    pub fn len(&self) -> usize {
        self.channels * self.height * self.width
    }

    pub fn is_flat(&self) -> bool {
        self.height == 1 && self.width == 1
    }
}

impl std::fmt::Display for Shape {
    /// Printed channels-last, the way the layer summary shows it.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_flat() {
            write!(f, "(None, {})", self.channels)
        } else {
            write!(f, "(None, {}, {}, {})", self.height, self.width, self.channels)
        }
    }
}

/// A single feature map `(channels, height, width)` stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3 {
    pub shape: Shape,
    pub data: Vec<f32>,
}

impl Tensor3 {
    pub fn zeros(shape: Shape) -> Tensor3 {
        Tensor3 { shape, data: vec![0.0; shape.len()] }
    }

    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Tensor3 {
        assert_eq!(
            data.len(),
            shape.len(),
            "Tensor data length {} does not match shape {:?}",
            data.len(),
            shape
        );
        Tensor3 { shape, data }
    }

    #[inline]
    pub fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.shape.height + y) * self.shape.width + x
    }

    #[inline]
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(c, y, x)]
    }

    #[inline]
    pub fn at_mut(&mut self, c: usize, y: usize, x: usize) -> &mut f32 {
        let i = self.index(c, y, x);
        &mut self.data[i]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reinterprets the same values under a new shape of equal length.
    pub fn reshape(self, shape: Shape) -> Tensor3 {
        Tensor3::from_vec(shape, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_channel_major() {
        let mut t = Tensor3::zeros(Shape::new(2, 3, 4));
        *t.at_mut(1, 2, 3) = 5.0;
        assert_eq!(t.data[23], 5.0);
        assert_eq!(t.at(1, 2, 3), 5.0);
    }

    #[test]
    fn display_is_channels_last() {
        assert_eq!(Shape::new(32, 14, 14).to_string(), "(None, 14, 14, 32)");
        assert_eq!(Shape::flat(10).to_string(), "(None, 10)");
    }
}
