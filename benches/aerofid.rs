use aerofid::refine::{refine_marker, upsample};
use aerofid::transform::warp_affine;
use aerofid::{
    match_template, AffineTransform, CompileConfig, CompiledTemplate, ImageView, InterpolationOrder,
    MatchConfig, Point, Raster, SubpixelConfig, Template,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn extract_patch(
    image: &[u8],
    img_width: usize,
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = (y0 + y) * img_width;
        for x in 0..width {
            out.push(image[row + x0 + x]);
        }
    }
    out
}

fn bench_matching(c: &mut Criterion) {
    let img_width = 512;
    let img_height = 512;
    let image = make_image(img_width, img_height);
    let image_view = ImageView::from_slice(&image, img_width, img_height).unwrap();

    let tpl_width = 64;
    let tpl_height = 64;
    let tpl_data = extract_patch(&image, img_width, 300, 140, tpl_width, tpl_height);
    let template = Template::new(tpl_data, tpl_width, tpl_height).unwrap();
    let compiled = CompiledTemplate::compile(
        &template,
        &CompileConfig {
            max_levels: 4,
            ..CompileConfig::default()
        },
    )
    .unwrap();

    let exhaustive = MatchConfig::default();
    c.bench_function("zncc_exhaustive", |b| {
        b.iter(|| black_box(match_template(image_view, &compiled, &exhaustive).unwrap()));
    });

    let exhaustive_par = MatchConfig {
        parallel: true,
        ..MatchConfig::default()
    };
    c.bench_function("zncc_exhaustive_parallel", |b| {
        b.iter(|| black_box(match_template(image_view, &compiled, &exhaustive_par).unwrap()));
    });

    let pyramid = MatchConfig {
        pyramid_levels: 4,
        beam_width: 6,
        per_level_topk: 32,
        roi_radius: 6,
        nms_radius: 4,
        ..MatchConfig::default()
    };
    c.bench_function("zncc_pyramid", |b| {
        b.iter(|| black_box(match_template(image_view, &compiled, &pyramid).unwrap()));
    });
}

fn bench_refinement(c: &mut Criterion) {
    let raster = Raster::new("bench", make_image(256, 256), 256, 256).unwrap();
    let crop = Raster::from_view("crop", raster.view().roi(96, 96, 64, 64).unwrap()).unwrap();

    c.bench_function("upsample_cubic_x8", |b| {
        b.iter(|| black_box(upsample(&crop, 8, InterpolationOrder::Cubic).unwrap()));
    });

    let factor = 4;
    let zoomed = upsample(&crop, factor, InterpolationOrder::Cubic).unwrap();
    let hr = Template::from_raster(
        Raster::from_view("hr", zoomed.view().roi(96, 96, 64, 64).unwrap()).unwrap(),
    );
    let hr = CompiledTemplate::single_level(&hr).unwrap();
    let cfg = SubpixelConfig {
        distance_from_loc: 48,
        factor,
        ..SubpixelConfig::default()
    };
    c.bench_function("refine_marker_x4", |b| {
        b.iter(|| black_box(refine_marker(&raster, Point::new(128.0, 128.0), &hr, &cfg).unwrap()));
    });
}

fn bench_warping(c: &mut Criterion) {
    let raster = Raster::new("bench", make_image(512, 512), 512, 512).unwrap();
    let tf = AffineTransform::new(0.9998, 0.0012, -0.0011, 1.0003, 3.25, -2.5);

    c.bench_function("warp_affine_linear", |b| {
        b.iter(|| black_box(warp_affine(&raster, &tf, InterpolationOrder::Linear).unwrap()));
    });
    c.bench_function("warp_affine_cubic", |b| {
        b.iter(|| black_box(warp_affine(&raster, &tf, InterpolationOrder::Cubic).unwrap()));
    });
}

criterion_group!(benches, bench_matching, bench_refinement, bench_warping);
criterion_main!(benches);
