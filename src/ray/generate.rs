//! Ray generation from pixel coordinates.

pub use super::*;
pub use crate::camera::Camera;

use crate::function::tensor_extensions::TensorFloatExtension;

/// Generating world-space rays through the pixels.
///
/// ## Arguments
///
/// * `pixels` - NDC coordinates from [`get_pixels_from_image`] or [`sample_pixels_randomly`].
/// * `image_size` - `[I_x, I_y]`, i.e., `[width, height]`
/// * `camera` - It is required.
///
/// ## Shapes
///
/// * `pixels` - `[N, 2]`
/// * `output` - [`RayBundle`] of shape `[N]` without samples
///
/// ## Details
///
/// 1. Every pixel is divided by [`Camera::focal_length`] and placed on
///    the image plane at depth `1`, i.e., `(p_0 / f_0, p_1 / f_1, 1)`.
/// 2. The points are unprojected into world space.
/// 3. The origins are [`Camera::camera_center`].
/// 4. The directions are the unit vectors from the origins to the points.
pub fn get_rays_from_pixels<B: Backend, C: Camera<B>>(
    pixels: Tensor<B, 2>,
    image_size: [u32; 2],
    camera: Option<&C>,
) -> Result<RayBundle<B>, Error> {
    #[cfg(debug_assertions)]
    log::debug!(target: "nerf_rays::ray::generate", "get_rays_from_pixels");

    let camera =
        camera.ok_or_else(|| Error::MissingDependency("camera".into()))?;

    let [image_size_x, image_size_y] = image_size;
    // I_y * I_x
    let pixel_count_max = image_size_x as usize * image_size_y as usize;
    if pixel_count_max == 0 {
        return Err(Error::Validation(
            format!("image_size {image_size:?}"),
            "positive".into(),
        ));
    }

    // N
    let [pixel_count, pixel_dim] = pixels.dims();
    if pixel_dim != 2 || pixel_count == 0 || pixel_count > pixel_count_max {
        return Err(Error::MismatchedShape(
            format!("pixels.dims() = {:?}", pixels.dims()),
            format!("[N, 2] where 0 < N <= {pixel_count_max}"),
        ));
    }

    let device = pixels.device();
    let focal_length = camera.focal_length();

    // [1, 2]
    let focal_length = Tensor::<B, 2>::from_data(
        TensorData::new(focal_length.to_vec(), [1, 2]).convert::<B::FloatElem>(),
        &device,
    );
    // [N, 3] <- [N, 2] + [N, 1]
    let points_plane = Tensor::cat(
        vec![
            pixels.div(focal_length),
            Tensor::ones([pixel_count, 1], &device),
        ],
        1,
    );

    // [N, 3]
    let points_world = camera.unproject_points(points_plane);
    // [N, 3] <- [1, 3]
    let origins = camera.camera_center(&device).repeat_dim(0, pixel_count);
    // [N, 3]
    let directions = (points_world - origins.to_owned()).normalize(1);

    #[cfg(debug_assertions)]
    log::debug!(
        target: "nerf_rays::ray::generate",
        "get_rays_from_pixels > {pixel_count} rays",
    );

    RayBundle::new(origins, directions)
}
