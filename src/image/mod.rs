//! Image color sampling at continuous NDC coordinates.

pub use crate::error::Error;
pub use burn::tensor::{backend::Backend, Int, Tensor, TensorData};

/// Sampling the image colors at the coordinates with bilinear interpolation.
///
/// ## Arguments
///
/// * `images` - `[B, I_y, I_x, C]`
/// * `xy_grid` - `[B, N, 2]`, NDC coordinates from [`crate::ray::get_pixels_from_image`]
///
/// ## Shapes
///
/// * `output` - `[B * N, C]`
///
/// ## Details
///
/// The coordinates are negated before sampling.
/// Component `0` addresses the image width and component `1` the image height.
///
/// The corners are aligned, i.e., `-1` is the center of the first pixel
/// and `1` is the center of the last pixel. Neighbors outside the image
/// contribute zeros.
///
/// The process is completely differentiable with respect to both inputs.
pub fn sample_colors<B: Backend>(
    images: Tensor<B, 4>,
    xy_grid: Tensor<B, 3>,
) -> Result<Tensor<B, 2>, Error> {
    #[cfg(debug_assertions)]
    log::debug!(target: "nerf_rays::image", "sample_colors");

    let [batch_size, image_size_y, image_size_x, channel_count] = images.dims();
    let [batch_size_grid, point_count, point_dim] = xy_grid.dims();
    if batch_size_grid != batch_size || point_dim != 2 {
        return Err(Error::MismatchedShape(
            format!("xy_grid.dims() = {:?}", xy_grid.dims()),
            format!("[{batch_size}, N, 2]"),
        ));
    }
    if batch_size == 0 || image_size_y == 0 || image_size_x == 0 {
        return Err(Error::MismatchedShape(
            format!("images.dims() = {:?}", images.dims()),
            "non-empty".into(),
        ));
    }

    let device = images.device();
    // B * N
    let sample_count = batch_size * point_count;
    // I_y * I_x
    let pixel_count = image_size_y * image_size_x;

    // [B * I_y * I_x, C]
    let colors = images.reshape([batch_size * pixel_count, channel_count]);
    // [B, N, 2]
    let grid = xy_grid.neg();

    // [B, N, 1]
    let positions_x = to_pixel_positions(
        grid.to_owned().slice([0..batch_size, 0..point_count, 0..1]),
        image_size_x,
    );
    // [B, N, 1]
    let positions_y = to_pixel_positions(
        grid.slice([0..batch_size, 0..point_count, 1..2]),
        image_size_y,
    );

    // [B, N, 1]
    let offsets = Tensor::<B, 3, Int>::from_data(
        TensorData::new(
            (0..batch_size)
                .flat_map(|b| [(b * pixel_count) as i64].repeat(point_count))
                .collect::<Vec<_>>(),
            [batch_size, point_count, 1],
        )
        .convert::<B::IntElem>(),
        &device,
    );

    let corners_x = Corner::pair(positions_x, image_size_x);
    let corners_y = Corner::pair(positions_y, image_size_y);

    let output = corners_y
        .iter()
        .flat_map(|corner_y| {
            corners_x.iter().map(move |corner_x| (corner_y, corner_x))
        })
        .map(|(corner_y, corner_x)| {
            // [B, N, 1]
            let weights =
                corner_y.weights.to_owned() * corner_x.weights.to_owned();
            // [B, N, 1]
            let indices = corner_y
                .indices
                .to_owned()
                .mul_scalar(image_size_x as i64)
                + corner_x.indices.to_owned()
                + offsets.to_owned();

            // [B * N, C]
            colors
                .to_owned()
                .select(0, indices.reshape([sample_count]))
                .mul(weights.reshape([sample_count, 1]))
        })
        .reduce(|sum, term| sum + term);

    Ok(output.unwrap_or_else(|| {
        Tensor::zeros([sample_count, channel_count], &device)
    }))
}

/// One of the two neighboring pixels along an axis.
struct Corner<B: Backend> {
    /// Pixel indices clamped into the image.
    ///
    /// `[B, N, 1]`
    indices: Tensor<B, 3, Int>,
    /// Interpolation weights, zero outside the image.
    ///
    /// `[B, N, 1]`
    weights: Tensor<B, 3>,
}

impl<B: Backend> Corner<B> {
    /// The lower and upper neighbors of the pixel positions.
    fn pair(
        positions: Tensor<B, 3>,
        size: usize,
    ) -> [Self; 2] {
        let index_max = (size - 1) as f32;

        // No neighbor beyond one pixel outside is inside the image.
        let positions = positions.clamp(-1.0, size as f32);
        // floor(p) for p >= -1
        let indices_lower =
            positions.to_owned().add_scalar(1.0).int().sub_scalar(1);
        let positions_lower = indices_lower.to_owned().float();
        let weights_upper = positions - positions_lower.to_owned();
        let weights_lower = weights_upper.to_owned().neg().add_scalar(1.0);

        let indices_upper = indices_lower.to_owned().add_scalar(1);
        let positions_upper = positions_lower.to_owned().add_scalar(1.0);

        let corner = |indices: Tensor<B, 3, Int>,
                      positions: Tensor<B, 3>,
                      weights: Tensor<B, 3>| {
            let mask = positions
                .to_owned()
                .greater_equal_elem(0.0)
                .float()
                .mul(positions.lower_equal_elem(index_max).float());
            Self {
                indices: indices.clamp(0, size as i64 - 1),
                weights: weights.mul(mask),
            }
        };

        [
            corner(indices_lower, positions_lower, weights_lower),
            corner(indices_upper, positions_upper, weights_upper),
        ]
    }
}

/// Mapping NDC coordinates to pixel positions with aligned corners.
///
/// `(c + 1) / 2 * (size - 1)`
fn to_pixel_positions<B: Backend>(
    coordinates: Tensor<B, 3>,
    size: usize,
) -> Tensor<B, 3> {
    coordinates
        .add_scalar(1.0)
        .mul_scalar((size - 1) as f32 / 2.0)
}
