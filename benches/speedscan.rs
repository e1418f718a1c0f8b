use criterion::{criterion_group, criterion_main, Criterion};
use speedscan::{DetectorSet, ImageView, MarkerPolicy, SimilarityMatcher, Template, ZnccMatcher};
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

fn bench_surface(c: &mut Criterion) {
    // A 360p frame with a small HUD-sized indicator.
    let img_width = 640;
    let img_height = 360;
    let image = make_image(img_width, img_height);
    let image_view = ImageView::from_slice(&image, img_width, img_height).unwrap();

    let tpl_width = 48;
    let tpl_height = 32;
    let tpl_data = extract_patch(&image, img_width, 300, 120, tpl_width, tpl_height);
    let template = Template::new(tpl_data, tpl_width, tpl_height).unwrap();

    let matcher = ZnccMatcher::new();
    c.bench_function("zncc_surface_360p", |b| {
        b.iter(|| black_box(matcher.score_surface(image_view, &template).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let matcher_par = ZnccMatcher::new().with_parallel(true);
        c.bench_function("zncc_surface_360p_parallel", |b| {
            b.iter(|| black_box(matcher_par.score_surface(image_view, &template).unwrap()));
        });
    }
}

fn bench_detector_set(c: &mut Criterion) {
    let img_width = 640;
    let img_height = 360;
    let image = make_image(img_width, img_height);
    let image_view = ImageView::from_slice(&image, img_width, img_height).unwrap();

    let door = Template::new(extract_patch(&image, img_width, 40, 40, 48, 32), 48, 32).unwrap();
    let flare = Template::new(extract_patch(&image, img_width, 500, 60, 32, 32), 32, 32).unwrap();
    let title = Template::new(extract_patch(&image, img_width, 200, 250, 64, 24), 64, 24).unwrap();

    let build = |parallel: bool| {
        let mut set = DetectorSet::with_matcher(ZnccMatcher::new()).with_parallel(parallel);
        set.add("door", door.clone(), None, MarkerPolicy::LastDisappearance)
            .unwrap();
        set.add("flare", flare.clone(), None, MarkerPolicy::LastDisappearance)
            .unwrap();
        set.add("title", title.clone(), Some(0.6), MarkerPolicy::LastDisappearance)
            .unwrap();
        set
    };

    // Last-disappearance detectors never settle, so every iteration scores.
    let mut set = build(false);
    let mut index = 0u64;
    c.bench_function("detector_set_three_markers", |b| {
        b.iter(|| {
            set.process_frame(image_view, index).unwrap();
            index += 1;
        });
    });

    if cfg!(feature = "rayon") {
        let mut set = build(true);
        let mut index = 0u64;
        c.bench_function("detector_set_three_markers_parallel", |b| {
            b.iter(|| {
                set.process_frame(image_view, index).unwrap();
                index += 1;
            });
        });
    }
}

criterion_group!(benches, bench_surface, bench_detector_set);
criterion_main!(benches);
