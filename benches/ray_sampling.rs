use burn::backend::NdArray;
use burn_jit::cubecl::client::SyncType;
use divan::Bencher;
use nerf_rays::{
    backend::{Backend, Wgpu},
    camera::PerspectiveCamera,
    image::sample_colors,
    ray::{get_pixels_from_image, get_rays_from_pixels, RayBundle},
    sampler::{Raysampler, StratifiedRaysamplerConfig},
};
use rand::{rngs::StdRng, SeedableRng};

fn main() {
    divan::main();
}

mod cpu {
    use super::*;

    type B = NdArray<f32>;

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn pixels_from_image(bencher: Bencher) {
        let device = Default::default();
        bencher.bench_local(|| {
            get_pixels_from_image::<B>(data::IMAGE_SIZE, &device).unwrap()
        });
    }

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn stratified_sample(bencher: Bencher) {
        bencher
            .with_inputs(|| data::ray_bundle::<B>(&Default::default()))
            .bench_local_values(|ray_bundle| data::sample(ray_bundle));
    }

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn colors(bencher: Bencher) {
        bencher
            .with_inputs(|| data::images_and_grid::<B>(&Default::default()))
            .bench_local_values(|(images, xy_grid)| {
                sample_colors(images, xy_grid).unwrap()
            });
    }
}

mod gpu {
    use super::*;

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn stratified_sample(bencher: Bencher) {
        bencher
            .with_inputs(|| data::ray_bundle::<Wgpu>(&Default::default()))
            .bench_local_values(|ray_bundle| {
                let output = data::sample(ray_bundle);
                Wgpu::sync(&Default::default(), SyncType::Wait);
                output
            });
    }

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn colors(bencher: Bencher) {
        bencher
            .with_inputs(|| data::images_and_grid::<Wgpu>(&Default::default()))
            .bench_local_values(|(images, xy_grid)| {
                let output = sample_colors(images, xy_grid).unwrap();
                Wgpu::sync(&Default::default(), SyncType::Wait);
                output
            });
    }
}

mod data {
    use super::*;
    use burn::tensor::Tensor;

    /// `[I_x, I_y]`
    pub const IMAGE_SIZE: [u32; 2] = [256, 256];

    pub fn ray_bundle<B: Backend>(device: &B::Device) -> RayBundle<B> {
        let camera = PerspectiveCamera::default();
        let pixels = get_pixels_from_image::<B>(IMAGE_SIZE, device).unwrap();
        get_rays_from_pixels(pixels, IMAGE_SIZE, Some(&camera)).unwrap()
    }

    pub fn sample<B: Backend>(ray_bundle: RayBundle<B>) -> RayBundle<B> {
        let sampler = StratifiedRaysamplerConfig::new().init().unwrap();
        Raysampler::<B>::sample(
            &sampler,
            ray_bundle,
            &mut StdRng::seed_from_u64(0x3D65),
        )
        .unwrap()
    }

    /// `([1, I_y, I_x, 3], [1, I_y * I_x, 2])`
    pub fn images_and_grid<B: Backend>(
        device: &B::Device
    ) -> (Tensor<B, 4>, Tensor<B, 3>) {
        let [image_size_x, image_size_y] = IMAGE_SIZE.map(|size| size as usize);
        let images = Tensor::random(
            [1, image_size_y, image_size_x, 3],
            burn::tensor::Distribution::Default,
            device,
        );
        let xy_grid = get_pixels_from_image::<B>(IMAGE_SIZE, device)
            .unwrap()
            .unsqueeze_dim(0);
        (images, xy_grid)
    }
}
