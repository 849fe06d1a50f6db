//! Ray bundle implementation.

pub use super::*;

use humansize::{format_size, BINARY};
use std::{fmt, ops::Range};

/// A batch of rays with their discretized samples.
///
/// The fields are stored flat over the rays in row-major order,
/// while [`RayBundle::shape`] keeps the logical ray-batch shape.
/// - `R` is [`RayBundle::ray_count`].
/// - `S` is [`RayBundle::sample_count`].
#[derive(Clone)]
pub struct RayBundle<B: Backend> {
    /// `[R, 3]`
    origins: Tensor<B, 2>,
    /// `[R, 3]`
    directions: Tensor<B, 2>,
    /// `[R, S, 3]`
    sample_points: Tensor<B, 3>,
    /// `[R, S, 1]`
    sample_lengths: Tensor<B, 3>,
    /// `[..]` whose product is `R`
    shape: Vec<usize>,
}

/// Constructors
impl<B: Backend> RayBundle<B> {
    /// Rays without samples.
    ///
    /// The sample fields are zeros with a single sample per ray,
    /// i.e., `[R, 1, 3]` and `[R, 1, 1]`.
    pub fn new(
        origins: Tensor<B, 2>,
        directions: Tensor<B, 2>,
    ) -> Result<Self, Error> {
        let [ray_count, _] = origins.dims();
        let device = origins.device();
        let sample_points = Tensor::zeros([ray_count, 1, 3], &device);
        let sample_lengths = Tensor::zeros([ray_count, 1, 1], &device);

        Self::try_new(origins, directions, sample_points, sample_lengths)
    }

    /// Rays with samples.
    ///
    /// It fails if the fields disagree in their ray or sample dimensions.
    pub fn try_new(
        origins: Tensor<B, 2>,
        directions: Tensor<B, 2>,
        sample_points: Tensor<B, 3>,
        sample_lengths: Tensor<B, 3>,
    ) -> Result<Self, Error> {
        let [ray_count, _] = origins.dims();
        Self::check_rays(&origins, &directions)?;
        Self::check_samples(ray_count, &sample_points, &sample_lengths)?;

        Ok(Self {
            origins,
            directions,
            sample_points,
            sample_lengths,
            shape: vec![ray_count],
        })
    }

    fn check_rays(
        origins: &Tensor<B, 2>,
        directions: &Tensor<B, 2>,
    ) -> Result<(), Error> {
        let [ray_count, origin_dim] = origins.dims();
        if origin_dim != 3 {
            return Err(Error::MismatchedShape(
                format!("origins.dims() = {:?}", origins.dims()),
                format!("[{ray_count}, 3]"),
            ));
        }
        if directions.dims() != [ray_count, 3] {
            return Err(Error::MismatchedShape(
                format!("directions.dims() = {:?}", directions.dims()),
                format!("[{ray_count}, 3]"),
            ));
        }

        Ok(())
    }

    fn check_samples(
        ray_count: usize,
        sample_points: &Tensor<B, 3>,
        sample_lengths: &Tensor<B, 3>,
    ) -> Result<(), Error> {
        let [_, sample_count, _] = sample_points.dims();
        if sample_points.dims() != [ray_count, sample_count, 3] {
            return Err(Error::MismatchedShape(
                format!("sample_points.dims() = {:?}", sample_points.dims()),
                format!("[{ray_count}, S, 3]"),
            ));
        }
        if sample_lengths.dims() != [ray_count, sample_count, 1] {
            return Err(Error::MismatchedShape(
                format!("sample_lengths.dims() = {:?}", sample_lengths.dims()),
                format!("[{ray_count}, {sample_count}, 1]"),
            ));
        }

        Ok(())
    }
}

/// Field getters
impl<B: Backend> RayBundle<B> {
    /// Ray origins in world space.
    ///
    /// The shape is `[R, 3]`.
    #[inline]
    pub fn origins(&self) -> Tensor<B, 2> {
        self.origins.to_owned()
    }

    /// Ray directions in world space.
    ///
    /// The shape is `[R, 3]`.
    #[inline]
    pub fn directions(&self) -> Tensor<B, 2> {
        self.directions.to_owned()
    }

    /// Sample points along the rays.
    ///
    /// The shape is `[R, S, 3]`.
    #[inline]
    pub fn sample_points(&self) -> Tensor<B, 3> {
        self.sample_points.to_owned()
    }

    /// Depths of the sample points along the rays.
    ///
    /// The shape is `[R, S, 1]`.
    #[inline]
    pub fn sample_lengths(&self) -> Tensor<B, 3> {
        self.sample_lengths.to_owned()
    }
}

/// Field replacement
impl<B: Backend> RayBundle<B> {
    /// Replacing [`RayBundle::origins`] and [`RayBundle::directions`].
    ///
    /// The ray count should stay the same.
    pub fn with_rays(
        self,
        origins: Tensor<B, 2>,
        directions: Tensor<B, 2>,
    ) -> Result<Self, Error> {
        let ray_count = self.ray_count();
        Self::check_rays(&origins, &directions)?;
        if origins.dims()[0] != ray_count {
            return Err(Error::MismatchedShape(
                format!("origins.dims() = {:?}", origins.dims()),
                format!("[{ray_count}, 3]"),
            ));
        }

        Ok(Self {
            origins,
            directions,
            ..self
        })
    }

    /// Replacing [`RayBundle::sample_points`] and [`RayBundle::sample_lengths`].
    ///
    /// The sample count may change.
    pub fn with_samples(
        self,
        sample_points: Tensor<B, 3>,
        sample_lengths: Tensor<B, 3>,
    ) -> Result<Self, Error> {
        Self::check_samples(self.ray_count(), &sample_points, &sample_lengths)?;

        Ok(Self {
            sample_points,
            sample_lengths,
            ..self
        })
    }
}

/// Shape operations
impl<B: Backend> RayBundle<B> {
    /// The ray-batch shape, i.e., `origins` without its coordinate axis.
    #[inline]
    pub fn shape(&self) -> Vec<usize> {
        self.shape.to_owned()
    }

    /// The ray-batch shape followed by `S`,
    /// i.e., `sample_points` without its coordinate axis.
    #[inline]
    pub fn sample_shape(&self) -> Vec<usize> {
        let mut shape = self.shape();
        shape.push(self.sample_count());
        shape
    }

    /// `R`
    #[inline]
    pub fn ray_count(&self) -> usize {
        self.origins.dims()[0]
    }

    /// `S`
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_points.dims()[1]
    }

    /// Reinterpreting the ray-batch shape.
    ///
    /// The element order of every field is preserved.
    pub fn reshape(
        self,
        shape: impl Into<Vec<usize>>,
    ) -> Result<Self, Error> {
        let shape = shape.into();
        let ray_count = self.ray_count();
        if shape.iter().product::<usize>() != ray_count {
            return Err(Error::MismatchedShape(
                format!("The product of shape {shape:?}"),
                format!("{ray_count}"),
            ));
        }

        Ok(Self { shape, ..self })
    }
}

/// Indexing
impl<B: Backend> RayBundle<B> {
    /// Slicing the rays along the leading dimensions.
    ///
    /// The dimensions without a range are taken whole.
    /// The output shape is the lengths of the ranges.
    pub fn slice(
        &self,
        ranges: &[Range<usize>],
    ) -> Result<Self, Error> {
        if ranges.len() > self.shape.len() {
            return Err(Error::Validation(
                format!("The count of ranges {}", ranges.len()),
                format!("no more than {}", self.shape.len()),
            ));
        }

        let ranges = self
            .shape
            .iter()
            .enumerate()
            .map(|(dim, &size)| {
                let range = ranges.get(dim).cloned().unwrap_or(0..size);
                if range.start > range.end || range.end > size {
                    return Err(Error::MismatchedShape(
                        format!("The range {range:?} at dim {dim}"),
                        format!("within 0..{size}"),
                    ));
                }
                Ok(range)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let shape = ranges.iter().map(|range| range.len()).collect::<Vec<_>>();

        // Row-major strides of the leading dimensions
        let strides = self
            .shape
            .iter()
            .rev()
            .scan(1, |stride, &size| {
                let current = *stride;
                *stride *= size;
                Some(current)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev();
        let indices = ranges.iter().zip(strides).fold(
            vec![0_i64],
            |bases, (range, stride)| {
                bases
                    .into_iter()
                    .flat_map(|base| {
                        range.to_owned().map(move |index| {
                            base + (index * stride) as i64
                        })
                    })
                    .collect()
            },
        );

        let index_count = indices.len();
        if index_count == 0 {
            return Err(Error::Validation(
                format!("The sliced shape {shape:?}"),
                "non-empty".into(),
            ));
        }

        let indices = Tensor::<B, 1, Int>::from_data(
            TensorData::new(indices, [index_count]).convert::<B::IntElem>(),
            &self.device(),
        );

        self.select(indices)?.reshape(shape)
    }

    /// Gathering the rays by their flat indices.
    ///
    /// The output shape is `[indices.dims()[0]]`.
    /// It fails if any index is outside `0..R`.
    pub fn select(
        &self,
        indices: Tensor<B, 1, Int>,
    ) -> Result<Self, Error> {
        let [index_count] = indices.dims();
        let ray_count = self.ray_count();

        let index_invalid = indices
            .to_owned()
            .into_data()
            .iter::<i64>()
            .find(|&index| index < 0 || index >= ray_count as i64);
        if let Some(index) = index_invalid {
            return Err(Error::MismatchedShape(
                format!("The ray index {index}"),
                format!("within 0..{ray_count}"),
            ));
        }

        Ok(Self {
            origins: self.origins().select(0, indices.to_owned()),
            directions: self.directions().select(0, indices.to_owned()),
            sample_points: self.sample_points().select(0, indices.to_owned()),
            sample_lengths: self.sample_lengths().select(0, indices),
            shape: vec![index_count],
        })
    }

    /// Splitting the rays into consecutive batches of at most `chunk_size` rays.
    ///
    /// Each batch has a flat shape.
    pub fn chunks(
        &self,
        chunk_size: usize,
    ) -> Result<impl Iterator<Item = Self> + '_, Error> {
        if chunk_size == 0 {
            return Err(Error::Validation(
                "chunk_size".into(),
                "positive".into(),
            ));
        }

        let ray_count = self.ray_count();
        Ok((0..ray_count).step_by(chunk_size).map(move |start| {
            let end = (start + chunk_size).min(ray_count);
            let sample_count = self.sample_count();
            Self {
                origins: self.origins().slice([start..end, 0..3]),
                directions: self.directions().slice([start..end, 0..3]),
                sample_points: self
                    .sample_points()
                    .slice([start..end, 0..sample_count, 0..3]),
                sample_lengths: self
                    .sample_lengths()
                    .slice([start..end, 0..sample_count, 0..1]),
                shape: vec![end - start],
            }
        }))
    }
}

/// Attribute getters
impl<B: Backend> RayBundle<B> {
    /// The device.
    #[inline]
    pub fn device(&self) -> B::Device {
        self.origins.device()
    }

    /// Size of the fields in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        let element_count = self.origins.shape().num_elements()
            + self.directions.shape().num_elements()
            + self.sample_points.shape().num_elements()
            + self.sample_lengths.shape().num_elements();
        element_count * size_of::<B::FloatElem>()
    }

    /// Readable size of the fields.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

impl<B: Backend> fmt::Debug for RayBundle<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("RayBundle<{}>", B::name()))
            .field("shape", &self.shape)
            .field("size", &self.size_readable())
            .field("origins.dims()", &self.origins.dims())
            .field("directions.dims()", &self.directions.dims())
            .field("sample_points.dims()", &self.sample_points.dims())
            .field("sample_lengths.dims()", &self.sample_lengths.dims())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    /// `R = 6`, `S = 2`, every value encodes its position.
    fn bundle_sampled(device: &<B as Backend>::Device) -> RayBundle<B> {
        let origins = Tensor::<B, 1, Int>::arange(0..18, device)
            .float()
            .reshape([6, 3]);
        let directions = origins.to_owned().add_scalar(100.0);
        let sample_points = Tensor::<B, 1, Int>::arange(0..36, device)
            .float()
            .reshape([6, 2, 3]);
        let sample_lengths = Tensor::<B, 1, Int>::arange(0..12, device)
            .float()
            .reshape([6, 2, 1]);
        RayBundle::try_new(origins, directions, sample_points, sample_lengths)
            .unwrap()
    }

    #[test]
    fn new_without_samples() {
        let device = &Default::default();
        let bundle = RayBundle::<B>::new(
            Tensor::zeros([4, 3], device),
            Tensor::ones([4, 3], device),
        )
        .unwrap();

        assert_eq!(bundle.shape(), vec![4]);
        assert_eq!(bundle.sample_shape(), vec![4, 1]);
        assert_eq!(bundle.sample_points().dims(), [4, 1, 3]);
        assert_eq!(bundle.sample_lengths().dims(), [4, 1, 1]);
        assert_eq!(bundle.size(), (12 + 12 + 12 + 4) * 4);
    }

    #[test]
    fn new_with_mismatched_fields() {
        let device = &Default::default();

        let result = RayBundle::<B>::new(
            Tensor::zeros([4, 3], device),
            Tensor::zeros([5, 3], device),
        );
        assert!(matches!(result, Err(Error::MismatchedShape(..))));

        let result = RayBundle::<B>::new(
            Tensor::zeros([4, 2], device),
            Tensor::zeros([4, 2], device),
        );
        assert!(matches!(result, Err(Error::MismatchedShape(..))));

        let result = RayBundle::<B>::try_new(
            Tensor::zeros([4, 3], device),
            Tensor::zeros([4, 3], device),
            Tensor::zeros([4, 8, 3], device),
            Tensor::zeros([4, 7, 1], device),
        );
        assert!(matches!(result, Err(Error::MismatchedShape(..))));
    }

    #[test]
    fn reshape_round_trip() {
        let device = &Default::default();
        let bundle = bundle_sampled(device);

        let reshaped = bundle.to_owned().reshape([2, 3]).unwrap();
        assert_eq!(reshaped.shape(), vec![2, 3]);
        assert_eq!(reshaped.sample_shape(), vec![2, 3, 2]);

        let restored = reshaped.reshape([6]).unwrap();
        assert_eq!(restored.shape(), bundle.shape());
        restored
            .origins()
            .into_data()
            .assert_eq(&bundle.origins().into_data(), true);
        restored
            .sample_points()
            .into_data()
            .assert_eq(&bundle.sample_points().into_data(), true);
        restored
            .sample_lengths()
            .into_data()
            .assert_eq(&bundle.sample_lengths().into_data(), true);

        let result = bundle.reshape([4, 2]);
        assert!(matches!(result, Err(Error::MismatchedShape(..))));
    }

    #[test]
    fn slice_leading_dims() {
        let device = &Default::default();
        let bundle = bundle_sampled(device).reshape([2, 3]).unwrap();

        // Rays (0, 1), (0, 2), (1, 1), (1, 2) are flat rays 1, 2, 4, 5
        let sliced = bundle.slice(&[0..2, 1..3]).unwrap();
        assert_eq!(sliced.shape(), vec![2, 2]);
        assert_eq!(sliced.sample_shape(), vec![2, 2, 2]);
        sliced.origins().into_data().assert_eq(
            &Tensor::<B, 2>::from_data(
                [
                    [3.0, 4.0, 5.0],
                    [6.0, 7.0, 8.0],
                    [12.0, 13.0, 14.0],
                    [15.0, 16.0, 17.0],
                ],
                device,
            )
            .into_data(),
            true,
        );
        sliced.sample_lengths().into_data().assert_eq(
            &Tensor::<B, 3>::from_data(
                [[[2.0], [3.0]], [[4.0], [5.0]], [[8.0], [9.0]], [[10.0], [11.0]]],
                device,
            )
            .into_data(),
            true,
        );
        sliced
            .directions()
            .into_data()
            .assert_eq(&sliced.origins().add_scalar(100.0).into_data(), true);

        // The trailing dimension is taken whole
        let sliced = bundle.slice(&[1..2]).unwrap();
        assert_eq!(sliced.shape(), vec![1, 3]);
        sliced.sample_points().into_data().assert_eq(
            &Tensor::<B, 1, Int>::arange(18..36, device)
                .float()
                .reshape([3, 2, 3])
                .into_data(),
            true,
        );

        let result = bundle.slice(&[0..3]);
        assert!(matches!(result, Err(Error::MismatchedShape(..))));
        let result = bundle.slice(&[0..1, 0..1, 0..1]);
        assert!(matches!(result, Err(Error::Validation(..))));
        let result = bundle.slice(&[1..1]);
        assert!(matches!(result, Err(Error::Validation(..))));
    }

    #[test]
    fn select_keeps_fields_in_sync() {
        let device = &Default::default();
        let bundle = bundle_sampled(device);

        let indices = Tensor::<B, 1, Int>::from_data([5, 0], device);
        let selected = bundle.select(indices).unwrap();
        assert_eq!(selected.shape(), vec![2]);
        selected.origins().into_data().assert_eq(
            &Tensor::<B, 2>::from_data(
                [[15.0, 16.0, 17.0], [0.0, 1.0, 2.0]],
                device,
            )
            .into_data(),
            true,
        );
        selected.sample_lengths().into_data().assert_eq(
            &Tensor::<B, 3>::from_data([[[10.0], [11.0]], [[0.0], [1.0]]], device)
                .into_data(),
            true,
        );
    }

    #[test]
    fn select_out_of_range() {
        let device = &Default::default();
        let bundle = bundle_sampled(device);

        let result = bundle.select(Tensor::<B, 1, Int>::from_data([1, 6], device));
        assert!(matches!(result, Err(Error::MismatchedShape(..))));

        let result = bundle.select(Tensor::<B, 1, Int>::from_data([-1], device));
        assert!(matches!(result, Err(Error::MismatchedShape(..))));
    }

    #[test]
    fn with_rays_keeps_samples() {
        let device = &Default::default();
        let bundle = bundle_sampled(device).reshape([2, 3]).unwrap();
        let origins = Tensor::<B, 2>::ones([6, 3], device);
        let directions = Tensor::<B, 2>::zeros([6, 3], device).add_scalar(-1.0);

        let replaced = bundle
            .to_owned()
            .with_rays(origins.to_owned(), directions.to_owned())
            .unwrap();
        assert_eq!(replaced.shape(), vec![2, 3]);
        assert_eq!(replaced.sample_shape(), vec![2, 3, 2]);
        replaced
            .origins()
            .into_data()
            .assert_eq(&origins.into_data(), true);
        replaced
            .directions()
            .into_data()
            .assert_eq(&directions.into_data(), true);
        replaced
            .sample_points()
            .into_data()
            .assert_eq(&bundle.sample_points().into_data(), true);
        replaced
            .sample_lengths()
            .into_data()
            .assert_eq(&bundle.sample_lengths().into_data(), true);
    }

    #[test]
    fn with_samples_replaces_only_samples() {
        let device = &Default::default();
        let bundle = bundle_sampled(device);
        let origins = bundle.origins();

        let replaced = bundle
            .to_owned()
            .with_samples(
                Tensor::ones([6, 4, 3], device),
                Tensor::ones([6, 4, 1], device),
            )
            .unwrap();
        assert_eq!(replaced.sample_count(), 4);
        assert_eq!(bundle.sample_count(), 2);
        replaced
            .origins()
            .into_data()
            .assert_eq(&origins.into_data(), true);

        let result = bundle.to_owned().with_samples(
            Tensor::ones([5, 4, 3], device),
            Tensor::ones([5, 4, 1], device),
        );
        assert!(matches!(result, Err(Error::MismatchedShape(..))));

        let result = bundle.with_rays(
            Tensor::ones([5, 3], device),
            Tensor::ones([5, 3], device),
        );
        assert!(matches!(result, Err(Error::MismatchedShape(..))));
    }

    #[test]
    fn chunks_cover_rays_in_order() {
        let device = &Default::default();
        let bundle = bundle_sampled(device).reshape([3, 2]).unwrap();

        let chunks = bundle.chunks(4).unwrap().collect::<Vec<_>>();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].shape(), vec![4]);
        assert_eq!(chunks[1].shape(), vec![2]);

        let origins = Tensor::cat(
            chunks.iter().map(RayBundle::origins).collect::<Vec<_>>(),
            0,
        );
        origins
            .into_data()
            .assert_eq(&bundle.origins().into_data(), true);
        chunks[1].sample_points().into_data().assert_eq(
            &Tensor::<B, 1, Int>::arange(24..36, device)
                .float()
                .reshape([2, 2, 3])
                .into_data(),
            true,
        );

        assert!(matches!(bundle.chunks(0), Err(Error::Validation(..))));
    }

    #[test]
    fn debug_lists_dims() {
        let device = &Default::default();
        let bundle = bundle_sampled(device);

        let output = format!("{bundle:?}");
        assert!(output.contains("shape: [6]"), "{output}");
        assert!(output.contains("sample_points.dims(): [6, 2, 3]"), "{output}");
    }
}
