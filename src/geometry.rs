//! Geometric utility objects.

use crate::num::MFloat;
use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dim3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::X => "x",
                Self::Y => "y",
                Self::Z => "z",
            }
        )
    }
}

use Dim3::{X, Y, Z};

/// Represents any quantity with three dimensional components.
#[derive(Clone, Debug, PartialEq)]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }

    /// Creates a new tuple containing copies of the three components.
    pub fn to_tuple(&self) -> (T, T, T)
    where
        T: Copy,
    {
        (self[X], self[Y], self[Z])
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

impl<T: fmt::Display> fmt::Display for In3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self[X], self[Y], self[Z])
    }
}

/// A 3D spatial coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Point3<F>(In3D<F>);

impl<F: MFloat> Point3<F> {
    /// Creates a new 3D point given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D point by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates the point resulting from shifting this point by the given
    /// offset along the given dimension.
    pub fn shifted(&self, dim: Dim3, offset: F) -> Self {
        let mut shifted = self.clone();
        shifted.0[dim] = shifted.0[dim] + offset;
        shifted
    }
}

impl<F> Index<Dim3> for Point3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: fmt::Display> fmt::Display for Point3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[X], self.0[Y], self.0[Z])
    }
}

/// A 3D vector quantity, such as a gradient.
#[derive(Clone, Debug, PartialEq)]
pub struct Vec3<F>(In3D<F>);

impl<F: MFloat> Vec3<F> {
    /// Creates a new 3D vector given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new vector with all components set to zero.
    pub fn zero() -> Self {
        Self(In3D::same(F::zero()))
    }

    /// Creates a new 3D vector by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Computes the sum of the absolute values of the components.
    ///
    /// This is the gradient magnitude used by the critical point
    /// classification, which is not the Euclidean norm.
    pub fn abs_sum(&self) -> F {
        // Qualified, as `Ieee754` also has an `abs`.
        num::Float::abs(self.0[X]) + num::Float::abs(self.0[Y]) + num::Float::abs(self.0[Z])
    }
}

impl<F> Index<Dim3> for Vec3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: fmt::Display> fmt::Display for Vec3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[X], self.0[Y], self.0[Z])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_magnitude_is_sum_of_absolute_components() {
        let vector = Vec3::new(-1.0, 2.0, -3.0);
        assert_eq!(vector.abs_sum(), 6.0);
    }

    #[test]
    fn point_shifting_moves_single_component() {
        let point = Point3::new(1.0, 2.0, 3.0);
        let shifted = point.shifted(Y, -0.5);
        assert_eq!(shifted, Point3::new(1.0, 1.5, 3.0));
    }
}
