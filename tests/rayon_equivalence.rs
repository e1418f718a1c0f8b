#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speedscan::kernel::rayon::zncc_surface_par;
use speedscan::{
    DetectorSet, ImageView, MarkerPolicy, OwnedImage, SimilarityMatcher, Template, ZnccMatcher,
};

fn noise(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(0..=255)).collect()
}

fn extract_patch(image: &[u8], img_width: usize, x0: usize, y0: usize, w: usize, h: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        let row = (y0 + y) * img_width;
        out.extend_from_slice(&image[row + x0..row + x0 + w]);
    }
    out
}

fn paste(image: &mut [u8], img_width: usize, patch: &[u8], x0: usize, y0: usize, w: usize) {
    for (y, row) in patch.chunks_exact(w).enumerate() {
        let dst = (y0 + y) * img_width + x0;
        image[dst..dst + w].copy_from_slice(row);
    }
}

#[test]
fn parallel_surface_matches_sequential() {
    let (width, height) = (120, 90);
    let mut rng = StdRng::seed_from_u64(42);
    let image = noise(&mut rng, width * height);
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let template = Template::new(extract_patch(&image, width, 40, 30, 24, 18), 24, 18).unwrap();

    let seq = ZnccMatcher::new().score_surface(view, &template).unwrap();
    let par = ZnccMatcher::new()
        .with_parallel(true)
        .score_surface(view, &template)
        .unwrap();
    let direct = zncc_surface_par(view, template.plan(), 1e-6).unwrap();

    assert_eq!((seq.width(), seq.height()), (par.width(), par.height()));
    for ((a, b), c) in seq.scores().iter().zip(par.scores()).zip(direct.scores()) {
        assert!((a - b).abs() <= 1e-6);
        assert!((a - c).abs() <= 1e-6);
    }
    let best = par.best().unwrap();
    assert_eq!((best.x, best.y), (40, 30));
}

#[test]
fn parallel_set_matches_sequential() {
    let (width, height) = (80, 60);
    let (tpl_w, tpl_h) = (16, 12);
    let mut rng = StdRng::seed_from_u64(9);
    let background = noise(&mut rng, width * height);
    let door = noise(&mut rng, tpl_w * tpl_h);
    let title = noise(&mut rng, tpl_w * tpl_h);

    // Door from frame 5 on, title on frames 3..=5.
    let frames: Vec<OwnedImage> = (0..12)
        .map(|index| {
            let mut data = background.clone();
            if index >= 5 {
                paste(&mut data, width, &door, 10, 12, tpl_w);
            }
            if (3..=5).contains(&index) {
                paste(&mut data, width, &title, 50, 30, tpl_w);
            }
            OwnedImage::new(data, width, height).unwrap()
        })
        .collect();
    let door = Template::new(door, tpl_w, tpl_h).unwrap();
    let title = Template::new(title, tpl_w, tpl_h).unwrap();

    let build = |parallel: bool| {
        let mut set = DetectorSet::with_matcher(ZnccMatcher::new().with_parallel(parallel))
            .with_parallel(parallel);
        set.add("door", door.clone(), None, MarkerPolicy::FirstAppearance)
            .unwrap();
        set.add(
            "start",
            title.clone(),
            None,
            MarkerPolicy::DependentAppearance {
                depends_on: "door".to_string(),
            },
        )
        .unwrap();
        set.add("end", title.clone(), None, MarkerPolicy::LastDisappearance)
            .unwrap();
        set.add(
            "instances",
            door.clone(),
            Some(0.9),
            MarkerPolicy::MultipleInstances {
                max_instances: 3,
                nms_radius: None,
            },
        )
        .unwrap();
        for (index, frame) in frames.iter().enumerate() {
            set.process_frame(frame.view(), index as u64).unwrap();
        }
        set
    };

    let seq = build(false);
    let par = build(true);
    assert!(par.parallel());
    for (a, b) in seq.iter().zip(par.iter()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.appeared_at(), b.appeared_at());
        assert_eq!(a.disappeared_at(), b.disappeared_at());
        assert_eq!(a.to_string(), b.to_string());
    }
    assert_eq!(seq.get("door").unwrap().appeared_at(), Some(5));
    assert_eq!(seq.get("start").unwrap().appeared_at(), Some(5));
    assert_eq!(seq.get("end").unwrap().appeared_at(), Some(3));
    assert_eq!(seq.get("end").unwrap().disappeared_at(), Some(6));
    assert_eq!(seq.get("instances").unwrap().appeared_at(), Some(5));
}
