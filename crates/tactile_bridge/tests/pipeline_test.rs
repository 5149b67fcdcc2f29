//! Integration tests for the frame -> raster -> lookup -> haptic pipeline.

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tactile_bridge::{HeaderCheck, IngestStep, LookupEngine, LookupStep, RasterIngest};
use tactile_core::{
    canonical_header, CoordinateMapper, DeviceExtents, HapticCommand, Orientation, PointerSample, RasterGeometry,
    SharedRaster,
};

const WIDTH: u32 = 480;
const HEIGHT: u32 = 300;
const DEVICE: DeviceExtents = DeviceExtents::new(21600, 13500);

/// Collects writes; panics on any write that is not exactly one command.
#[derive(Clone, Default)]
struct CommandSink {
    commands: Arc<Mutex<Vec<[u8; 2]>>>,
}

impl CommandSink {
    fn commands(&self) -> Vec<[u8; 2]> {
        self.commands.lock().unwrap().clone()
    }
}

impl Write for CommandSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let command: [u8; 2] = buf.try_into().expect("every write is exactly one 2-byte command");
        self.commands.lock().unwrap().push(command);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn geometry() -> RasterGeometry {
    RasterGeometry::new(WIDTH, HEIGHT)
}

fn frame(header: &str, fill: impl Fn(usize, usize) -> u8) -> Vec<u8> {
    let geometry = geometry();
    let mut bytes = header.as_bytes().to_vec();
    bytes.resize(geometry.header_bytes(), b' ');
    for y in 0..HEIGHT as usize {
        for x in 0..WIDTH as usize {
            bytes.push(fill(x, y));
        }
    }
    assert_eq!(bytes.len(), geometry.frame_size());
    bytes
}

fn ingest_frames(raster: &Arc<SharedRaster>, frames: &[Vec<u8>]) -> Vec<IngestStep> {
    let stream: Vec<u8> = frames.concat();
    let mut ingest = RasterIngest::new(Cursor::new(stream), Arc::clone(raster), Duration::ZERO);
    (0..frames.len()).map(|_| ingest.step()).collect()
}

fn lookup(
    raster: &Arc<SharedRaster>,
    orientation: Orientation,
    samples: &[PointerSample],
) -> (Vec<[u8; 2]>, LookupEngine<Cursor<Vec<u8>>, CommandSink>) {
    let stream: Vec<u8> = samples.iter().flat_map(PointerSample::to_bytes).collect();
    let sink = CommandSink::default();
    let mapper = CoordinateMapper::new(DEVICE, raster.geometry(), orientation);
    let mut engine = LookupEngine::new(Cursor::new(stream), sink.clone(), Arc::clone(raster), mapper);
    for _ in samples {
        assert!(matches!(engine.step(), LookupStep::Emitted { delivered: true, .. }));
    }
    assert_eq!(engine.step(), LookupStep::Idle);
    (sink.commands(), engine)
}

#[test]
fn test_round_trip_lookup() {
    let raster = Arc::new(SharedRaster::new(geometry()));
    let known = frame(&canonical_header(WIDTH, HEIGHT), |x, y| if (x, y) == (240, 150) { 200 } else { 1 });
    assert_eq!(known[geometry().header_bytes() + 150 * 480 + 240], 200);

    let steps = ingest_frames(&raster, &[known]);
    assert_eq!(
        steps,
        vec![IngestStep::Published {
            generation: 1,
            header: HeaderCheck::Valid
        }]
    );

    let (commands, _) = lookup(&raster, Orientation::identity(), &[PointerSample::new(10800, 6750)]);
    assert_eq!(commands, vec![[0, 200]]);
}

#[test]
fn test_pen_lift_is_always_silent() {
    let raster = Arc::new(SharedRaster::new(geometry()));
    ingest_frames(&raster, &[frame(&canonical_header(WIDTH, HEIGHT), |_, _| 255)]);

    for orientation in [Orientation::identity(), Orientation::rotated()] {
        let (commands, engine) = lookup(&raster, orientation, &[PointerSample::LIFTED; 4]);
        assert_eq!(commands, vec![[0, 0]; 4]);
        assert_eq!(engine.stats().samples(), 4);
    }
}

#[test]
fn test_random_samples_never_leave_raster() {
    let raster = Arc::new(SharedRaster::new(geometry()));
    ingest_frames(&raster, &[frame(&canonical_header(WIDTH, HEIGHT), |_, _| 255)]);

    let mut rng = StdRng::seed_from_u64(0x7AC7);
    let samples: Vec<PointerSample> = (0..5_000)
        .map(|i| match i % 3 {
            0 => PointerSample::new(rng.gen(), rng.gen()),
            1 => PointerSample::new(rng.gen_range(-100..21_700), rng.gen_range(-100..13_600)),
            _ => PointerSample::new(rng.gen_range(0..21_600), rng.gen_range(0..13_500)),
        })
        .collect();

    for orientation in [Orientation::identity(), Orientation::rotated()] {
        let mapper = CoordinateMapper::new(DEVICE, geometry(), orientation);
        let (commands, _) = lookup(&raster, orientation, &samples);

        for (sample, command) in samples.iter().zip(&commands) {
            let inside = mapper
                .map(*sample)
                .is_some_and(|p| (0..i64::from(WIDTH)).contains(&p.x) && (0..i64::from(HEIGHT)).contains(&p.y));
            let expected = if inside { 255 } else { 0 };
            assert_eq!(command, &[0, expected], "sample {sample:?}");
        }
    }
}

#[test]
fn test_repeated_frame_is_idempotent() {
    let raster = Arc::new(SharedRaster::new(geometry()));
    let image = frame(&canonical_header(WIDTH, HEIGHT), |x, y| ((x * 7 + y * 13) % 256) as u8);
    let samples = [
        PointerSample::new(10800, 6750),
        PointerSample::new(1, 1),
        PointerSample::new(21599, 13499),
        PointerSample::new(5000, 9000),
    ];

    ingest_frames(&raster, &[image.clone()]);
    let (once, _) = lookup(&raster, Orientation::rotated(), &samples);

    ingest_frames(&raster, &[image]);
    assert_eq!(raster.generation(), 2);
    let (twice, _) = lookup(&raster, Orientation::rotated(), &samples);

    assert_eq!(once, twice);
}

#[test]
fn test_mismatched_header_is_served() {
    let raster = Arc::new(SharedRaster::new(geometry()));
    // Same byte length, wrong declared dimensions
    let swapped = frame("P5 300 480 255\n", |_, _| 33);
    let garbage = frame("not a header", |_, _| 44);

    let steps = ingest_frames(&raster, &[swapped, garbage]);
    assert!(matches!(
        steps[0],
        IngestStep::Published {
            header: HeaderCheck::Mismatch(h),
            ..
        } if (h.declared_width, h.declared_height) == (300, 480)
    ));
    assert!(matches!(
        steps[1],
        IngestStep::Published {
            header: HeaderCheck::Unparseable,
            ..
        }
    ));

    // The last frame is live regardless of its header
    let (commands, _) = lookup(&raster, Orientation::identity(), &[PointerSample::new(10800, 6750)]);
    assert_eq!(commands, vec![[0, 44]]);
}

#[test]
fn test_command_encoding() {
    assert_eq!(HapticCommand::realtime(200).to_bytes(), [0, 200]);

    let raster = Arc::new(SharedRaster::new(geometry()));
    ingest_frames(&raster, &[frame(&canonical_header(WIDTH, HEIGHT), |x, _| x as u8)]);

    let samples: Vec<PointerSample> = (1..50).map(|i| PointerSample::new(i * 400, 6750)).collect();
    let (commands, _) = lookup(&raster, Orientation::identity(), &samples);
    assert_eq!(commands.len(), samples.len());
    assert!(commands.iter().all(|c| c[0] == HapticCommand::MODE_REALTIME));
}

#[cfg(unix)]
#[test]
fn test_end_to_end_over_fifos() {
    use std::fs::{File, OpenOptions};
    use std::io::Read;
    use tactile_bridge::{ChannelPaths, PipelineSupervisor};
    use tactile_core::BridgeConfig;

    let dir = tempfile::tempdir().unwrap();
    let paths = ChannelPaths::new(dir.path().join("pgm"), dir.path().join("pnt"), dir.path().join("haptic"));
    let snapshot_path = dir.path().join("image.pgm");

    let mut config = BridgeConfig::default();
    config.raster.width = WIDTH;
    config.raster.height = HEIGHT;
    config.orientation = Orientation::identity();
    config.snapshot.path = snapshot_path.clone();
    config.ingest.eof_backoff_ms = 1;

    let supervisor = PipelineSupervisor::new(config);
    let raster = supervisor.raster();
    let trigger = supervisor.trigger();
    let run_paths = paths.clone();
    std::thread::spawn(move || {
        let _ = supervisor.run(&run_paths);
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    while !paths.haptic.exists() {
        assert!(Instant::now() < deadline, "FIFOs never created");
        std::thread::sleep(Duration::from_millis(5));
    }

    // Attaching the haptic driver lets startup finish
    let mut haptic = File::open(&paths.haptic).unwrap();

    let image = frame(&canonical_header(WIDTH, HEIGHT), |x, y| if (x, y) == (240, 150) { 200 } else { 3 });
    let mut frames = OpenOptions::new().write(true).open(&paths.frames).unwrap();
    frames.write_all(&image).unwrap();
    while raster.generation() < 1 {
        assert!(Instant::now() < deadline, "frame never published");
        std::thread::sleep(Duration::from_millis(1));
    }

    let mut pointer = OpenOptions::new().write(true).open(&paths.pointer).unwrap();
    pointer.write_all(&PointerSample::new(10800, 6750).to_bytes()).unwrap();

    let mut command = [0u8; 2];
    haptic.read_exact(&mut command).unwrap();
    assert_eq!(command, [0, 200]);

    // The snapshot is taken at the start of the next loop iteration
    trigger.request();
    pointer.write_all(&PointerSample::LIFTED.to_bytes()).unwrap();
    haptic.read_exact(&mut command).unwrap();
    assert_eq!(command, [0, 0]);

    let expected_len = geometry().frame_size();
    loop {
        let written = std::fs::read(&snapshot_path).unwrap_or_default();
        if written.len() == expected_len {
            assert_eq!(written, image);
            break;
        }
        assert!(Instant::now() < deadline, "snapshot never written");
        std::thread::sleep(Duration::from_millis(5));
    }
}
