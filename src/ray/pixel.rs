//! Pixel coordinates in NDC space.

pub use super::*;

use rand::{seq::index, Rng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Generating the coordinates of every pixel in NDC space.
///
/// ## Arguments
///
/// * `image_size` - `[I_x, I_y]`, i.e., `[width, height]`
///
/// ## Shapes
///
/// * `output` - `[I_y * I_x, 2]`
///
/// ## Details
///
/// Pixel `i` maps to `2 / I_x * i - 1` in x and pixel `j` maps to
/// `2 / I_y * j - 1` in y, so every coordinate lies in `[-1, 1)`.
///
/// The pairs are ordered as `(y, x)` in row-major order,
/// i.e., y is the outer loop and x is the inner loop.
pub fn get_pixels_from_image<B: Backend>(
    image_size: [u32; 2],
    device: &B::Device,
) -> Result<Tensor<B, 2>, Error> {
    let [image_size_x, image_size_y] = image_size;
    if image_size_x == 0 || image_size_y == 0 {
        return Err(Error::Validation(
            format!("image_size {image_size:?}"),
            "positive".into(),
        ));
    }

    // I_y * I_x
    let pixel_count = image_size_x as usize * image_size_y as usize;
    // 2 / I_x
    let step_x = 2.0 / image_size_x as f64;
    // 2 / I_y
    let step_y = 2.0 / image_size_y as f64;

    let coordinates = (0..image_size_y)
        .into_par_iter()
        .flat_map_iter(|j| {
            let y = (step_y * j as f64 - 1.0) as f32;
            (0..image_size_x).flat_map(move |i| {
                let x = (step_x * i as f64 - 1.0) as f32;
                [y, x]
            })
        })
        .collect::<Vec<_>>();

    Ok(Tensor::from_data(
        TensorData::new(coordinates, [pixel_count, 2]).convert::<B::FloatElem>(),
        device,
    ))
}

/// Sampling `pixel_count` distinct pixel coordinates uniformly at random.
///
/// ## Shapes
///
/// * `output` - `[min(pixel_count, I_y * I_x), 2]`
///
/// ## Details
///
/// The output is the leading part of a random permutation over
/// [`get_pixels_from_image`]. A count beyond the pixels of the image
/// is clamped to all of them.
pub fn sample_pixels_randomly<B: Backend, R: Rng + ?Sized>(
    pixel_count: usize,
    image_size: [u32; 2],
    rng: &mut R,
    device: &B::Device,
) -> Result<Tensor<B, 2>, Error> {
    let pixels = get_pixels_from_image::<B>(image_size, device)?;
    let [pixel_count_max, _] = pixels.dims();

    if pixel_count > pixel_count_max {
        log::warn!(
            target: "nerf_rays::ray::pixel",
            "sample_pixels_randomly > Clamping pixel_count {pixel_count} to {pixel_count_max}",
        );
    }
    let pixel_count = pixel_count.min(pixel_count_max);

    let indices = index::sample(rng, pixel_count_max, pixel_count)
        .into_iter()
        .map(|index| index as i64)
        .collect::<Vec<_>>();
    let indices = Tensor::<B, 1, Int>::from_data(
        TensorData::new(indices, [pixel_count]).convert::<B::IntElem>(),
        device,
    );

    Ok(pixels.select(0, indices))
}
