//! Detectors driven by the real ZNCC matcher over synthetic noise frames.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speedscan::{
    scan_frames, DetectorSet, DetectorState, FrameRate, MarkerPolicy, MemoryFrames, OwnedImage,
    RunSummary, Template, ZnccMatcher,
};

const WIDTH: usize = 96;
const HEIGHT: usize = 64;
const TPL_W: usize = 12;
const TPL_H: usize = 10;

fn noise(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(0..=255)).collect()
}

fn paste(frame: &mut [u8], tpl: &[u8], x0: usize, y0: usize) {
    for y in 0..TPL_H {
        let dst = (y0 + y) * WIDTH + x0;
        frame[dst..dst + TPL_W].copy_from_slice(&tpl[y * TPL_W..(y + 1) * TPL_W]);
    }
}

struct Scene {
    background: Vec<u8>,
    door: Vec<u8>,
    title: Vec<u8>,
    coin: Vec<u8>,
}

impl Scene {
    fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            background: noise(&mut rng, WIDTH * HEIGHT),
            door: noise(&mut rng, TPL_W * TPL_H),
            title: noise(&mut rng, TPL_W * TPL_H),
            coin: noise(&mut rng, TPL_W * TPL_H),
        }
    }

    fn template(data: &[u8]) -> Template {
        Template::new(data.to_vec(), TPL_W, TPL_H).unwrap()
    }

    /// Door from frame 3 on, title on frames 0..=4, two coins on frames 2 and 4.
    fn frames(&self, count: usize) -> Vec<OwnedImage> {
        (0..count)
            .map(|local| {
                let mut data = self.background.clone();
                if local >= 3 {
                    paste(&mut data, &self.door, 10, 8);
                }
                if local <= 4 {
                    paste(&mut data, &self.title, 50, 30);
                }
                if local == 2 || local == 4 {
                    paste(&mut data, &self.coin, 5, 45);
                    paste(&mut data, &self.coin, 70, 45);
                }
                OwnedImage::new(data, WIDTH, HEIGHT).unwrap()
            })
            .collect()
    }
}

#[test]
fn zncc_detectors_follow_pasted_markers() {
    let scene = Scene::new(7);
    let rate = FrameRate::new(30000, 1001).unwrap();

    let mut set = DetectorSet::new();
    set.add(
        "door",
        Scene::template(&scene.door),
        None,
        MarkerPolicy::FirstAppearance,
    )
    .unwrap();
    set.add(
        "title",
        Scene::template(&scene.title),
        Some(0.6),
        MarkerPolicy::FirstDisappearance,
    )
    .unwrap();
    set.add(
        "coins",
        Scene::template(&scene.coin),
        None,
        MarkerPolicy::MultipleInstances {
            max_instances: 4,
            nms_radius: None,
        },
    )
    .unwrap();

    let source = MemoryFrames::new(scene.frames(8), rate).starting_at(1000);
    let report = scan_frames(source, &mut set).unwrap();
    assert_eq!(report.frames, 8);
    assert_eq!(report.last_index, Some(1007));

    let door = set.get("door").unwrap();
    assert_eq!(door.appeared_at(), Some(1003));
    let expected = 1003.0 * 1001.0 / 30000.0;
    assert!((door.timestamp(rate).unwrap().seconds() - expected).abs() < 1e-9);

    let title = set.get("title").unwrap();
    assert_eq!(title.appeared_at(), Some(1000));
    assert_eq!(title.disappeared_at(), Some(1005));

    let coins = set.get("coins").unwrap();
    assert_eq!(coins.appeared_at(), Some(1002));
    let DetectorState::MultipleInstances(instances) = coins.state() else {
        panic!("coins should track instances");
    };
    let indices: Vec<u64> = instances.frames().iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![1002, 1004]);
    for frame in instances.frames() {
        let mut spots: Vec<(usize, usize)> = frame.locations.iter().map(|l| (l.x, l.y)).collect();
        spots.sort_unstable();
        assert_eq!(spots, vec![(5, 45), (70, 45)]);
        for location in &frame.locations {
            assert_eq!((location.width, location.height), (TPL_W, TPL_H));
            assert!(location.score > 0.99);
        }
    }

    let summary = RunSummary::from_set(&set, "door", "title", rate).unwrap();
    assert_eq!(summary.start_frame, 1003);
    assert_eq!(summary.end_frame, 1005);
    assert!((summary.duration.seconds() - 2.0 * 1001.0 / 30000.0).abs() < 1e-9);
}

#[test]
fn max_instances_keeps_the_strongest() {
    let scene = Scene::new(11);
    let rate = FrameRate::from_fps(60).unwrap();

    let mut set = DetectorSet::new();
    set.add(
        "coin",
        Scene::template(&scene.coin),
        None,
        MarkerPolicy::MultipleInstances {
            max_instances: 1,
            nms_radius: Some(3),
        },
    )
    .unwrap();
    scan_frames(MemoryFrames::new(scene.frames(5), rate), &mut set).unwrap();

    let DetectorState::MultipleInstances(instances) = set.get("coin").unwrap().state() else {
        panic!("coin should track instances");
    };
    assert_eq!(instances.nms_radius(), 3);
    assert_eq!(instances.frames().len(), 2);
    assert!(instances.frames().iter().all(|f| f.locations.len() == 1));
}

#[test]
fn flat_frames_never_trigger() {
    let scene = Scene::new(3);
    let rate = FrameRate::from_fps(30).unwrap();
    let frames = vec![OwnedImage::new(vec![0u8; WIDTH * HEIGHT], WIDTH, HEIGHT).unwrap(); 4];

    let mut set = DetectorSet::with_matcher(ZnccMatcher::new().with_min_var_i(1e-3));
    set.add(
        "door",
        Scene::template(&scene.door),
        Some(0.01),
        MarkerPolicy::FirstAppearance,
    )
    .unwrap();
    scan_frames(MemoryFrames::new(frames, rate), &mut set).unwrap();

    let door = set.get("door").unwrap();
    assert!(!door.triggered());
    assert!(door.failure().is_none());
    assert_eq!(set.frames_processed(), 4);
}

#[test]
fn undersized_frames_disable_the_detector() {
    let scene = Scene::new(5);
    let rate = FrameRate::from_fps(30).unwrap();
    let small = OwnedImage::new(vec![128u8; 8 * 8], 8, 8).unwrap();

    let mut set = DetectorSet::new();
    set.add(
        "door",
        Scene::template(&scene.door),
        None,
        MarkerPolicy::FirstAppearance,
    )
    .unwrap();
    scan_frames(MemoryFrames::new(vec![small.clone(), small], rate), &mut set).unwrap();

    let door = set.get("door").unwrap();
    assert!(door.failure().is_some());
    assert!(door.is_settled());
    assert!(!door.triggered());
}

#[test]
fn unbounded_instance_limit_reports_every_instance() {
    let scene = Scene::new(13);
    let rate = FrameRate::from_fps(30).unwrap();

    let mut set = DetectorSet::new();
    set.add(
        "coins",
        Scene::template(&scene.coin),
        None,
        MarkerPolicy::MultipleInstances {
            max_instances: usize::MAX,
            nms_radius: None,
        },
    )
    .unwrap();
    scan_frames(MemoryFrames::new(scene.frames(3), rate), &mut set).unwrap();

    let coins = set.get("coins").unwrap();
    assert!(coins.failure().is_none());
    let DetectorState::MultipleInstances(instances) = coins.state() else {
        panic!("coins should track instances");
    };
    assert_eq!(instances.frames().len(), 1);
    assert_eq!(instances.frames()[0].index, 2);
    assert_eq!(instances.frames()[0].locations.len(), 2);
}
