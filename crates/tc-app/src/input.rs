//! Scalar-or-sequence numeric input.

/// Values accepted where a front end may pass one reading or many.
pub trait IntoValues {
    fn into_values(self) -> Vec<f64>;
}

impl IntoValues for f64 {
    fn into_values(self) -> Vec<f64> {
        vec![self]
    }
}

impl IntoValues for Vec<f64> {
    fn into_values(self) -> Vec<f64> {
        self
    }
}

impl IntoValues for &Vec<f64> {
    fn into_values(self) -> Vec<f64> {
        self.clone()
    }
}

impl IntoValues for &[f64] {
    fn into_values(self) -> Vec<f64> {
        self.to_vec()
    }
}

impl<const N: usize> IntoValues for [f64; N] {
    fn into_values(self) -> Vec<f64> {
        self.to_vec()
    }
}

impl<const N: usize> IntoValues for &[f64; N] {
    fn into_values(self) -> Vec<f64> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_sequences_coerce() {
        assert_eq!(2.5_f64.into_values(), vec![2.5]);
        assert_eq!(vec![1.0, 2.0].into_values(), vec![1.0, 2.0]);
        assert_eq!([1.0, 2.0, 3.0].into_values(), vec![1.0, 2.0, 3.0]);
        assert_eq!((&[4.0][..]).into_values(), vec![4.0]);
    }
}
