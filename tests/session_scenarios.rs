use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use image::{ImageFormat, Rgba, RgbaImage};

use retouch::app::{EditorController, EditorEvent, Effect, HeadlessRuntime};
use retouch::clipboard::{ClipboardBackend, ClipboardResult};
use retouch::editor::{
    ActionType, BrushOptions, DetachedCropper, EncodedImage, MaskSurface, HISTORY_CAPACITY,
};
use retouch::geometry::{ElementBox, ImageSize, PixelRect, PointerPosition};
use retouch::input::SourceFile;
use retouch::notification::{LogNotifier, NoticeKind};
use retouch::remote::{RemovalPayload, RemovalRequest, RemovalService, ServiceResult};
use retouch::state::{EditMode, ModeEvent};
use retouch::storage::StorageService;

fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding should succeed");
    bytes
}

fn png(width: u32, height: u32, shade: u8) -> EncodedImage {
    EncodedImage::from_bytes(png_bytes(width, height, shade), "image/png")
        .expect("generated png should decode")
}

/// Answers every request with a fresh image of the same size, shaded by
/// call number.
#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<RemovalRequest>>,
    shade: AtomicU8,
}

impl RecordingService {
    fn calls(&self) -> Vec<RemovalRequest> {
        self.calls.lock().expect("calls lock should not be poisoned").clone()
    }
}

impl RemovalService for RecordingService {
    fn remove(&self, request: &RemovalRequest) -> ServiceResult<EncodedImage> {
        self.calls
            .lock()
            .expect("calls lock should not be poisoned")
            .push(request.clone());
        let shade = self.shade.fetch_add(1, Ordering::SeqCst) + 1;
        let size = request.image.size();
        Ok(png(size.width, size.height, shade))
    }
}

#[derive(Clone, Default)]
struct RecordingClipboard(Rc<RefCell<Vec<(usize, String)>>>);

impl ClipboardBackend for RecordingClipboard {
    fn copy_image(&self, bytes: &[u8], media_type: &str) -> ClipboardResult<()> {
        self.0.borrow_mut().push((bytes.len(), media_type.to_string()));
        Ok(())
    }
}

struct Harness {
    runtime: HeadlessRuntime<DetachedCropper>,
    service: Arc<RecordingService>,
    clipboard: RecordingClipboard,
    export_dir: std::path::PathBuf,
}

impl Harness {
    fn new(name: &str) -> Self {
        let service = Arc::new(RecordingService::default());
        let clipboard = RecordingClipboard::default();
        let export_dir = std::env::temp_dir().join(format!(
            "retouch-scenario-{name}-{}",
            std::process::id()
        ));
        let runtime = HeadlessRuntime::new(
            EditorController::new(DetachedCropper::new(), BrushOptions::default()),
            service.clone(),
            Box::new(clipboard.clone()),
            Box::new(StorageService::with_export_dir(export_dir.clone())),
            Box::new(LogNotifier),
        );
        Self {
            runtime,
            service,
            clipboard,
            export_dir,
        }
    }

    fn load(&mut self, width: u32, height: u32) {
        self.runtime.dispatch(EditorEvent::LoadFile(SourceFile::new(
            "scan.jpg",
            "image/png",
            png_bytes(width, height, 0),
        )));
        self.runtime.dispatch(EditorEvent::ImageLaidOut(ElementBox::sized(
            f64::from(width),
            f64::from(height),
        )));
    }

    fn stroke(&mut self, from: (f64, f64), to: (f64, f64)) {
        self.runtime
            .dispatch(EditorEvent::PointerDown(PointerPosition::new(from.0, from.1)));
        self.runtime
            .dispatch(EditorEvent::PointerMove(PointerPosition::new(to.0, to.1)));
        self.runtime.dispatch(EditorEvent::PointerUp);
        self.runtime.wait_for_requests();
    }

    fn controller(&self) -> &EditorController<DetachedCropper> {
        self.runtime.controller()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.export_dir);
    }
}

#[test]
fn erase_stroke_sends_one_request_with_full_size_mask() {
    let mut harness = Harness::new("erase");
    harness.load(400, 300);
    harness.stroke((100.0, 100.0), (180.0, 120.0));

    let calls = harness.service.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0].payload {
        RemovalPayload::Mask { png, size, action } => {
            assert_eq!(*size, ImageSize::new(400, 300));
            assert_eq!(*action, ActionType::Erase);
            let mask = image::load_from_memory_with_format(png, ImageFormat::Png)
                .expect("mask should be a png");
            assert_eq!((mask.width(), mask.height()), (400, 300));
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let session = harness.controller().session();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.current_image(), Some(&png(400, 300, 1)));
    assert!(harness.runtime.notices().is_empty());
}

#[test]
fn history_keeps_the_last_ten_edits_and_undoes_in_reverse() {
    let mut harness = Harness::new("history");
    harness.load(64, 48);
    for edit in 1..=12_u8 {
        harness.stroke((10.0, 10.0), (20.0, f64::from(edit)));
        assert_eq!(
            harness.controller().session().history().len(),
            usize::from(edit).min(HISTORY_CAPACITY)
        );
    }

    for expected in (2..=11_u8).rev() {
        harness.runtime.dispatch(EditorEvent::Undo);
        assert_eq!(
            harness.controller().session().current_image(),
            Some(&png(64, 48, expected))
        );
    }
    harness.runtime.dispatch(EditorEvent::Undo);
    assert_eq!(
        harness.controller().session().current_image(),
        Some(&png(64, 48, 2))
    );
    let last = harness.runtime.notices().last().expect("empty undo should raise a notice");
    assert_eq!(last.kind, NoticeKind::EmptyHistory);
}

#[test]
fn submitted_regions_always_fit_the_image() {
    let mut harness = Harness::new("regions");
    harness.load(400, 300);
    harness
        .runtime
        .dispatch(EditorEvent::SwitchMode(ModeEvent::SelectRect));

    for rect in [
        PixelRect::new(300, 200, 100, 100),
        PixelRect::new(350, 200, 100, 100),
        PixelRect::new(0, 0, 400, 300),
        PixelRect::new(399, 299, 50, 50),
    ] {
        harness.runtime.dispatch(EditorEvent::CoordinatesEdited(rect));
        harness.runtime.wait_for_requests();
    }

    let regions: Vec<PixelRect> = harness
        .service
        .calls()
        .iter()
        .map(|call| match call.payload {
            RemovalPayload::Region(rect) => rect,
            ref other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(
        regions,
        vec![
            PixelRect::new(300, 200, 100, 100),
            PixelRect::new(350, 200, 50, 100),
            PixelRect::new(0, 0, 400, 300),
            PixelRect::new(399, 299, 1, 1),
        ]
    );
    assert!(regions
        .iter()
        .all(|rect| rect.fits_within(ImageSize::new(400, 300))));
    assert!(harness.controller().session().history().is_empty());
}

#[test]
fn submit_while_in_flight_has_no_effect() {
    let mut controller = EditorController::new(DetachedCropper::new(), BrushOptions::default());
    let now = Instant::now();
    controller.handle(
        EditorEvent::LoadFile(SourceFile::new("a.png", "image/png", png_bytes(40, 30, 0))),
        now,
    );
    controller.handle(EditorEvent::ImageLaidOut(ElementBox::sized(40.0, 30.0)), now);
    controller.handle(EditorEvent::SwitchMode(ModeEvent::SelectRect), now);

    let first = controller.handle(EditorEvent::Process, now);
    assert!(matches!(first.as_slice(), [Effect::Submit(_)]));
    let selection = controller.session().selection().current();
    let revision = controller.session().revision();

    assert!(controller.handle(EditorEvent::Process, now).is_empty());
    assert!(controller.handle(EditorEvent::CropEnd, now).is_empty());
    assert_eq!(controller.session().selection().current(), selection);
    assert_eq!(controller.session().revision(), revision);
    assert!(controller.is_request_in_flight());
}

#[test]
fn brush_rect_brush_round_trip_yields_fresh_mask() {
    let mut harness = Harness::new("modes");
    harness.load(400, 300);
    harness
        .runtime
        .dispatch(EditorEvent::PointerDown(PointerPosition::new(20.0, 20.0)));
    harness
        .runtime
        .dispatch(EditorEvent::PointerMove(PointerPosition::new(60.0, 20.0)));
    assert!(harness.controller().mask().is_some_and(MaskSurface::has_strokes));

    harness
        .runtime
        .dispatch(EditorEvent::SwitchMode(ModeEvent::SelectRect));
    assert_eq!(harness.controller().mode(), EditMode::Rect);
    assert!(harness.controller().mask().is_none());
    assert!(harness.controller().cropper().is_attached());

    harness
        .runtime
        .dispatch(EditorEvent::ImageLaidOut(ElementBox::sized(200.0, 150.0)));
    harness
        .runtime
        .dispatch(EditorEvent::SwitchMode(ModeEvent::SelectBrush));

    let mask = harness.controller().mask().expect("brush mode should own a mask");
    assert_eq!(mask.size(), ImageSize::new(200, 150));
    assert!(!mask.has_strokes());
    assert!(!harness.controller().cropper().is_attached());
    assert!(harness.service.calls().is_empty());
}

#[test]
fn exports_are_written_and_copied_under_derived_names() {
    let mut harness = Harness::new("export");
    harness.load(32, 32);
    harness.stroke((4.0, 4.0), (20.0, 20.0));

    harness.runtime.dispatch(EditorEvent::Download);
    harness.runtime.dispatch(EditorEvent::Copy);

    let exports = harness.runtime.exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(
        exports[0].file_name().and_then(|name| name.to_str()),
        Some("scan_processed.png")
    );
    let written = std::fs::read(&exports[0]).expect("export should be readable");
    assert_eq!(written, png_bytes(32, 32, 1));

    let copies = harness.clipboard.0.borrow();
    assert_eq!(copies.as_slice(), &[(written.len(), "image/png".to_string())]);
    assert_eq!(harness.controller().view().copy_label, "Copied!");
}
