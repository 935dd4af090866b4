use super::*;
use image::AnimationDecoder as _;

fn out_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("gif_unit")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn cfg(looping: bool) -> SinkConfig {
    SinkConfig {
        width: 4,
        height: 3,
        frame_delay_ms: 100,
        looping,
    }
}

fn solid(rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: 4,
        height: 3,
        data: rgba.repeat(12),
        premultiplied: true,
    }
}

fn decode(path: &Path) -> Vec<image::Frame> {
    let file = std::io::BufReader::new(File::open(path).unwrap());
    image::codecs::gif::GifDecoder::new(file)
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
}

#[test]
fn writes_every_frame_with_configured_delay() {
    let path = out_dir("frames").join("nested").join("anim.gif");
    let mut sink = GifSink::new(&path);
    sink.begin(cfg(true)).unwrap();
    for (i, c) in [[255, 0, 0, 255], [0, 0, 255, 255], [0, 128, 0, 255]]
        .into_iter()
        .enumerate()
    {
        sink.push_frame(i as u64, &solid(c)).unwrap();
    }
    sink.end().unwrap();
    assert_eq!(sink.frames_written(), 3);

    let frames = decode(&path);
    assert_eq!(frames.len(), 3);
    for f in &frames {
        let (n, d) = f.delay().numer_denom_ms();
        assert_eq!(n / d, 100);
        assert_eq!(f.buffer().dimensions(), (4, 3));
    }
    let px = frames[1].buffer().get_pixel(0, 0);
    assert!(px[2] > 200 && px[0] < 50, "expected blue, got {px:?}");
}

#[test]
fn loop_extension_follows_config() {
    let dir = out_dir("looping");
    for (looping, name) in [(true, "loop.gif"), (false, "once.gif")] {
        let path = dir.join(name);
        let mut sink = GifSink::new(&path);
        sink.begin(cfg(looping)).unwrap();
        sink.push_frame(0, &solid([0, 0, 0, 255])).unwrap();
        sink.push_frame(1, &solid([255, 255, 255, 255])).unwrap();
        sink.end().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let has_loop = bytes.windows(11).any(|w| w == b"NETSCAPE2.0");
        assert_eq!(has_loop, looping, "{name}");
    }
}

#[cfg(target_os = "linux")]
#[test]
fn write_failure_surfaces_from_end() {
    let mut sink = GifSink::new("/dev/full");
    sink.begin(cfg(true)).unwrap();
    sink.push_frame(0, &solid([255, 0, 0, 255])).unwrap();
    let err = sink.end().unwrap_err();
    assert!(matches!(err, TaxcompError::Other(_)), "{err:?}");
    assert!(format!("{err:#}").contains("/dev/full"));
}

#[test]
fn out_of_order_frames_are_rejected() {
    let mut sink = GifSink::new(out_dir("order").join("a.gif"));
    sink.begin(cfg(true)).unwrap();
    sink.push_frame(3, &solid([0, 0, 0, 255])).unwrap();
    let err = sink.push_frame(3, &solid([0, 0, 0, 255])).unwrap_err();
    assert!(matches!(err, TaxcompError::Validation(_)));
}

#[test]
fn size_mismatch_is_a_render_error() {
    let mut sink = GifSink::new(out_dir("size").join("a.gif"));
    sink.begin(cfg(true)).unwrap();
    let wrong = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    let err = sink.push_frame(0, &wrong).unwrap_err();
    assert!(matches!(err, TaxcompError::Render(_)));
}

#[test]
fn push_before_begin_is_rejected() {
    let mut sink = GifSink::new(out_dir("early").join("a.gif"));
    assert!(sink.push_frame(0, &solid([0, 0, 0, 255])).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn zero_delay_is_rejected() {
    let mut sink = GifSink::new(out_dir("delay").join("a.gif"));
    let mut c = cfg(true);
    c.frame_delay_ms = 0;
    assert!(matches!(
        sink.begin(c).unwrap_err(),
        TaxcompError::Validation(_)
    ));
}

#[test]
fn flatten_blends_translucent_pixels_over_background() {
    let src = [0u8, 0, 0, 0, 128, 0, 0, 128];
    let mut dst = [0u8; 8];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [255, 255, 255, 255]).unwrap();
    assert_eq!(&dst[0..4], &[255, 255, 255, 255]);
    assert_eq!(dst[3], 255);
    assert_eq!(dst[7], 255);
    assert_eq!(dst[4], 255);
    assert_eq!(dst[5], 127);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = [0u8; 4];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 8], true, BACKGROUND).is_err());
}
