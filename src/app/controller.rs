use std::time::Instant;

use super::event::{EditorEvent, Effect};
use super::orchestrator::{RequestOrchestrator, SubmitError};
use super::timer::{Debouncer, COPY_FEEDBACK_PERIOD, CROP_END_QUIET_PERIOD, RESIZE_QUIET_PERIOD};
use super::view::{ControlsView, CopyState, PROCESS_BUSY_LABEL, PROCESS_LABEL};
use crate::clipboard::ClipboardResult;
use crate::editor::{
    default_region, ActionType, BrushOptions, EditSession, EncodedImage, Magnifier, MaskSurface,
    RegionCropper, RegionInbox,
};
use crate::error::AppError;
use crate::geometry::{ElementBox, PixelRect, PointerPosition, ScaleFactors};
use crate::input::{accept_file, first_pasted_image, SourceFile};
use crate::notification::{Notice, NoticeKind};
use crate::remote::{RequestTicket, ServiceResult};
use crate::state::{EditMode, ModeEvent, ModeMachine, ModeTransition};
use crate::storage::{export_file_name, ExportArtifact, ExportKind};

/// Single owner of the editing session. Every input arrives as an
/// [`EditorEvent`]; side effects leave as [`Effect`]s for the host to run.
pub struct EditorController<C: RegionCropper> {
    session: EditSession,
    modes: ModeMachine,
    orchestrator: RequestOrchestrator,
    cropper: C,
    cropper_attached: bool,
    cropper_revision: u64,
    region_inbox: RegionInbox,
    mask: Option<MaskSurface>,
    mask_generation: u64,
    magnifier: Magnifier,
    result_generation: u64,
    lens_generation: u64,
    resize_timer: Debouncer,
    pending_layout: Option<ElementBox>,
    crop_end_timer: Debouncer,
    copy_state: CopyState,
    copy_reset_timer: Debouncer,
}

impl<C: RegionCropper> EditorController<C> {
    pub fn new(cropper: C, brush: BrushOptions) -> Self {
        Self {
            session: EditSession::new(brush),
            modes: ModeMachine::new(),
            orchestrator: RequestOrchestrator::new(),
            cropper,
            cropper_attached: false,
            cropper_revision: 0,
            region_inbox: RegionInbox::new(),
            mask: None,
            mask_generation: 0,
            magnifier: Magnifier::new(),
            result_generation: 0,
            lens_generation: 0,
            resize_timer: Debouncer::new(RESIZE_QUIET_PERIOD),
            pending_layout: None,
            crop_end_timer: Debouncer::new(CROP_END_QUIET_PERIOD),
            copy_state: CopyState::Idle,
            copy_reset_timer: Debouncer::new(COPY_FEEDBACK_PERIOD),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn mode(&self) -> EditMode {
        self.modes.mode()
    }

    pub fn mode_history(&self) -> &[ModeTransition] {
        self.modes.history()
    }

    pub fn mask(&self) -> Option<&MaskSurface> {
        self.mask.as_ref()
    }

    pub fn magnifier(&self) -> &Magnifier {
        &self.magnifier
    }

    pub fn cropper(&self) -> &C {
        &self.cropper
    }

    pub fn is_request_in_flight(&self) -> bool {
        self.orchestrator.is_in_flight()
    }

    pub fn copy_state(&self) -> CopyState {
        self.copy_state
    }

    /// Earliest instant at which a pending timer wants a [`EditorEvent::Tick`].
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.resize_timer.deadline(),
            self.crop_end_timer.deadline(),
            self.copy_reset_timer.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn handle(&mut self, event: EditorEvent, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.absorb_region_changes();
        match event {
            EditorEvent::LoadFile(file) => self.load(file, &mut effects),
            EditorEvent::PasteItems(items) => match first_pasted_image(items) {
                Some(file) => self.load(file, &mut effects),
                None => tracing::debug!("paste carried no image item"),
            },
            EditorEvent::ImageLaidOut(image_box) => self.on_image_laid_out(image_box),
            EditorEvent::ViewportResized(image_box) => {
                self.pending_layout = Some(image_box);
                self.resize_timer.schedule(now);
            }
            EditorEvent::SwitchMode(event) => self.switch_mode(event, &mut effects),
            EditorEvent::PointerDown(pointer) => self.on_pointer_down(pointer),
            EditorEvent::PointerMove(pointer) => self.on_pointer_move(pointer),
            EditorEvent::PointerUp | EditorEvent::PointerLeave => {
                self.on_pointer_released(&mut effects)
            }
            EditorEvent::SetBrushSize(size) => self.set_brush_size(size),
            EditorEvent::SetActionType(action) => self.set_action_type(action),
            EditorEvent::ClearMask => {
                if let Some(mask) = self.mask.as_mut() {
                    mask.clear();
                }
            }
            EditorEvent::Undo => self.undo(&mut effects),
            EditorEvent::Process => {
                self.crop_end_timer.cancel();
                self.submit(&mut effects);
            }
            EditorEvent::CropEnd => {
                if self.modes.mode() == EditMode::Rect && self.cropper_attached {
                    self.crop_end_timer.schedule(now);
                }
            }
            EditorEvent::CoordinatesEdited(rect) => self.on_coordinates_edited(rect, &mut effects),
            EditorEvent::RequestFinished { ticket, outcome } => {
                self.on_request_finished(ticket, outcome, &mut effects)
            }
            EditorEvent::Download => match self.export_artifact() {
                Some(artifact) => effects.push(Effect::Download(artifact)),
                None => push_notice(&mut effects, NoticeKind::Input, "no result to download yet"),
            },
            EditorEvent::Copy => self.copy(&mut effects),
            EditorEvent::CopyFinished(result) => self.on_copy_finished(result, now, &mut effects),
            EditorEvent::ResultLaidOut { image, container } => {
                self.on_result_laid_out(image, container)
            }
            EditorEvent::ResultPointerEnter => self.magnifier.enter(),
            EditorEvent::ResultPointerMove(pointer) => {
                self.magnifier.track(pointer);
            }
            EditorEvent::ResultPointerLeave => self.magnifier.leave(),
            EditorEvent::Tick => {}
        }
        self.fire_due_timers(now, &mut effects);
        effects
    }

    pub fn view(&self) -> ControlsView {
        let mode = self.modes.mode();
        let image_loaded = self.session.current_image().is_some();
        let pending_mode = self.orchestrator.in_flight().map(|pending| pending.mode);
        let rect_busy = pending_mode == Some(EditMode::Rect);
        let export_enabled = self.export_artifact().is_some();
        let process_enabled = image_loaded
            && match mode {
                EditMode::Rect => self.session.selection().current().is_some() && !rect_busy,
                EditMode::Brush => true,
            };

        ControlsView {
            mode,
            image_loaded,
            process_visible: image_loaded,
            process_enabled,
            process_label: if rect_busy {
                PROCESS_BUSY_LABEL
            } else {
                PROCESS_LABEL
            },
            busy_cursor: pending_mode == Some(EditMode::Brush),
            mask_visible: mode == EditMode::Brush && self.mask.is_some(),
            cropper_visible: mode == EditMode::Rect && self.cropper_attached,
            brush_settings_visible: mode == EditMode::Brush,
            rect_settings_visible: mode == EditMode::Rect,
            result_panel_visible: mode == EditMode::Rect,
            export_enabled,
            undo_enabled: image_loaded,
            copy_label: self.copy_state.label(),
            copy_enabled: export_enabled && self.copy_state != CopyState::Copying,
            coordinates: match mode {
                EditMode::Rect => self.session.selection().coordinate_fields(),
                EditMode::Brush => None,
            },
        }
    }

    /// The compare result in rect mode, the processed working image in
    /// brush mode.
    pub fn export_artifact(&self) -> Option<ExportArtifact> {
        let (image, kind) = match self.modes.mode() {
            EditMode::Rect => (self.session.compare_result()?, ExportKind::Cropped),
            EditMode::Brush if self.session.has_processed_image() => {
                (self.session.current_image()?, ExportKind::Processed)
            }
            EditMode::Brush => return None,
        };
        let original_name = self.session.original_file().map(|file| file.name.as_str());
        Some(ExportArtifact {
            file_name: export_file_name(original_name, kind),
            kind,
            image: image.clone(),
        })
    }

    fn load(&mut self, file: SourceFile, effects: &mut Vec<Effect>) {
        let (image, original) = match accept_file(file) {
            Ok(accepted) => accepted,
            Err(err) => {
                push_error(effects, err);
                return;
            }
        };
        tracing::info!(
            name = %original.name,
            width = image.size().width,
            height = image.size().height,
            "image loaded"
        );
        self.session.begin(image, original);
        self.mask = None;
        self.detach_cropper();
        self.magnifier.destroy();
        self.pending_layout = None;
        self.resize_timer.cancel();
        self.crop_end_timer.cancel();
        self.copy_reset_timer.cancel();
        self.copy_state = CopyState::Idle;
    }

    fn on_image_laid_out(&mut self, image_box: ElementBox) {
        if self.session.current_image().is_none() {
            return;
        }
        self.session.set_image_box(image_box);
        match self.modes.mode() {
            EditMode::Brush => self.allocate_mask(false),
            EditMode::Rect => {
                if self.cropper_attached && self.cropper_revision == self.session.revision() {
                    self.reposition_cropper(image_box);
                } else {
                    self.attach_cropper();
                }
            }
        }
    }

    fn apply_viewport(&mut self, image_box: ElementBox) {
        if self.session.current_image().is_none() {
            return;
        }
        tracing::debug!(width = image_box.width, height = image_box.height, "viewport settled");
        self.session.set_image_box(image_box);
        match self.modes.mode() {
            EditMode::Brush => self.allocate_mask(true),
            EditMode::Rect if self.cropper_attached => self.reposition_cropper(image_box),
            EditMode::Rect => {}
        }
    }

    fn switch_mode(&mut self, event: ModeEvent, effects: &mut Vec<Effect>) {
        let transition = match self.modes.transition(event) {
            Ok(transition) => transition,
            Err(err) => {
                push_error(effects, err);
                return;
            }
        };
        if !transition.changes_mode() {
            return;
        }
        tracing::debug!(from = %transition.from, to = %transition.to, "mode switched");
        match transition.to {
            EditMode::Rect => self.enter_rect(),
            EditMode::Brush => self.enter_brush(),
        }
    }

    fn enter_rect(&mut self) {
        self.mask = None;
        self.attach_cropper();
    }

    fn enter_brush(&mut self) {
        self.detach_cropper();
        self.session.selection_mut().clear();
        self.crop_end_timer.cancel();
        self.magnifier.leave();
        self.allocate_mask(true);
    }

    /// Drops the current surface and allocates one sized to the displayed
    /// image. Without `force` an existing surface of the right size is kept.
    fn allocate_mask(&mut self, force: bool) {
        let Some(size) = self.session.image_box().and_then(|image_box| image_box.pixel_size())
        else {
            self.mask = None;
            return;
        };
        if !force && self.mask.as_ref().is_some_and(|mask| mask.size() == size) {
            return;
        }
        self.mask = Some(MaskSurface::new(size, self.session.brush()));
        self.mask_generation = self.mask_generation.wrapping_add(1);
        tracing::debug!(
            width = size.width,
            height = size.height,
            generation = self.mask_generation,
            "mask surface allocated"
        );
    }

    fn attach_cropper(&mut self) {
        let (Some(image_box), Some(natural)) =
            (self.session.image_box(), self.session.natural_size())
        else {
            return;
        };
        if self.cropper_attached {
            self.cropper.destroy();
        }
        self.cropper.attach(image_box);
        self.cropper.on_region_changed(self.region_inbox.handler());
        self.cropper_attached = true;
        self.cropper_revision = self.session.revision();

        let region = default_region(natural);
        self.session.selection_mut().commit_natural(region, natural);
        if let Some(scale) = ScaleFactors::between(image_box, natural) {
            self.cropper.set_region(scale.to_displayed(region));
        }
        self.region_inbox.discard();
    }

    fn reposition_cropper(&mut self, image_box: ElementBox) {
        self.cropper.attach(image_box);
        self.push_selection_to_cropper();
    }

    fn push_selection_to_cropper(&mut self) {
        let (Some(image_box), Some(natural), Some(rect)) = (
            self.session.image_box(),
            self.session.natural_size(),
            self.session.selection().current(),
        ) else {
            return;
        };
        if let Some(scale) = ScaleFactors::between(image_box, natural) {
            self.cropper.set_region(scale.to_displayed(rect));
        }
        self.region_inbox.discard();
    }

    fn detach_cropper(&mut self) {
        if self.cropper_attached {
            self.cropper.destroy();
            self.cropper_attached = false;
        }
        self.region_inbox.discard();
    }

    fn absorb_region_changes(&mut self) {
        let regions = self.region_inbox.drain();
        if regions.is_empty() || self.modes.mode() != EditMode::Rect {
            return;
        }
        let (Some(image_box), Some(natural)) =
            (self.session.image_box(), self.session.natural_size())
        else {
            return;
        };
        for region in regions {
            let committed = self
                .session
                .selection_mut()
                .commit_displayed(region, image_box, natural);
            tracing::debug!(?region, ?committed, "crop region changed");
        }
    }

    fn on_pointer_down(&mut self, pointer: PointerPosition) {
        if self.modes.mode() != EditMode::Brush {
            return;
        }
        let Some(image_box) = self.session.image_box() else {
            return;
        };
        if let Some(mask) = self.mask.as_mut() {
            mask.begin_stroke(image_box.local_point(pointer));
        }
    }

    fn on_pointer_move(&mut self, pointer: PointerPosition) {
        let Some(image_box) = self.session.image_box() else {
            return;
        };
        if let Some(mask) = self.mask.as_mut().filter(|mask| mask.is_drawing()) {
            mask.extend_stroke(image_box.local_point(pointer));
        }
    }

    fn on_pointer_released(&mut self, effects: &mut Vec<Effect>) {
        let ended = self.mask.as_mut().and_then(MaskSurface::end_stroke);
        if ended.is_some() && self.modes.mode() == EditMode::Brush {
            self.submit(effects);
        }
    }

    fn set_brush_size(&mut self, size: u32) {
        self.session.brush_mut().set_size(size);
        let size = self.session.brush().size();
        if let Some(mask) = self.mask.as_mut() {
            mask.set_line_width(size);
        }
    }

    fn set_action_type(&mut self, action: ActionType) {
        self.session.brush_mut().set_action(action);
        if let Some(mask) = self.mask.as_mut() {
            mask.set_action(action);
        }
    }

    fn undo(&mut self, effects: &mut Vec<Effect>) {
        if self.orchestrator.is_in_flight() {
            push_notice(
                effects,
                NoticeKind::Input,
                "cannot undo while a removal request is in progress",
            );
            return;
        }
        match self.session.undo().map(|_| ()) {
            Ok(()) => {
                tracing::info!(
                    remaining = self.session.history().len(),
                    "restored previous image"
                );
                if let Some(mask) = self.mask.as_mut() {
                    mask.clear();
                }
            }
            Err(err) => push_error(effects, err),
        }
    }

    fn on_coordinates_edited(&mut self, rect: PixelRect, effects: &mut Vec<Effect>) {
        if self.modes.mode() != EditMode::Rect || !self.cropper_attached {
            return;
        }
        let Some(natural) = self.session.natural_size() else {
            return;
        };
        if self.session.selection_mut().commit_natural(rect, natural).is_none() {
            push_notice(
                effects,
                NoticeKind::Input,
                format!(
                    "region {},{} {}x{} lies outside the {}x{} image",
                    rect.x, rect.y, rect.width, rect.height, natural.width, natural.height
                ),
            );
            return;
        }
        self.push_selection_to_cropper();
        self.crop_end_timer.cancel();
        self.submit(effects);
    }

    fn submit(&mut self, effects: &mut Vec<Effect>) {
        let mode = self.modes.mode();
        let mask = self.mask.as_ref().map(|mask| (mask, self.mask_generation));
        match self.orchestrator.submit(&self.session, mode, mask) {
            Ok(request) => {
                if mode == EditMode::Rect {
                    self.modes.lock();
                }
                effects.push(Effect::Submit(request));
            }
            Err(SubmitError::RequestInFlight) => {
                tracing::debug!(mode = %mode, "submit dropped while a request is in flight");
            }
            Err(err) => push_error(effects, err),
        }
    }

    fn on_request_finished(
        &mut self,
        ticket: RequestTicket,
        outcome: ServiceResult<EncodedImage>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(pending) = self.orchestrator.finish(ticket) else {
            tracing::warn!(ticket = ticket.0, "response for unknown request ignored");
            return;
        };
        if pending.mode == EditMode::Rect {
            self.modes.unlock();
        }
        if pending.revision != self.session.revision() {
            if outcome.is_ok() {
                push_notice(
                    effects,
                    NoticeKind::Input,
                    format!(
                        "discarded the {} result: the image changed while it was being processed",
                        pending.mode
                    ),
                );
            } else {
                tracing::debug!(ticket = ticket.0, "failure for a superseded image ignored");
            }
            return;
        }

        match outcome {
            Ok(image) => {
                tracing::info!(ticket = ticket.0, mode = %pending.mode, "removal succeeded");
                match pending.mode {
                    EditMode::Rect => {
                        self.session.set_compare_result(image);
                        self.result_generation = self.result_generation.wrapping_add(1);
                        self.magnifier.destroy();
                    }
                    EditMode::Brush => {
                        self.session.apply_in_place(image);
                        if let (Some(mask), Some(strokes)) = (self.mask.as_mut(), pending.strokes) {
                            if strokes.surface == self.mask_generation {
                                mask.clear_through(strokes.last_stroke);
                            }
                        }
                    }
                }
            }
            Err(err) => push_error(effects, err),
        }
    }

    fn copy(&mut self, effects: &mut Vec<Effect>) {
        if self.copy_state == CopyState::Copying {
            return;
        }
        match self.export_artifact() {
            Some(artifact) => {
                self.copy_state = CopyState::Copying;
                self.copy_reset_timer.cancel();
                effects.push(Effect::CopyToClipboard(artifact.image));
            }
            None => push_notice(effects, NoticeKind::Input, "no result to copy yet"),
        }
    }

    fn on_copy_finished(
        &mut self,
        result: ClipboardResult<()>,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(()) => {
                self.copy_state = CopyState::Copied;
                self.copy_reset_timer.schedule(now);
            }
            Err(err) => {
                self.copy_state = CopyState::Idle;
                push_error(effects, err);
            }
        }
    }

    fn on_result_laid_out(&mut self, image: ElementBox, container: ElementBox) {
        if self.session.compare_result().is_none() {
            return;
        }
        if self.magnifier.is_created() && self.lens_generation == self.result_generation {
            self.magnifier.resize(image, container);
        } else {
            self.magnifier.create(image, container);
            self.lens_generation = self.result_generation;
        }
    }

    fn fire_due_timers(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        if self.resize_timer.fire_if_due(now) {
            if let Some(image_box) = self.pending_layout.take() {
                self.apply_viewport(image_box);
            }
        }
        if self.crop_end_timer.fire_if_due(now) && self.modes.mode() == EditMode::Rect {
            self.submit(effects);
        }
        if self.copy_reset_timer.fire_if_due(now) && self.copy_state == CopyState::Copied {
            self.copy_state = CopyState::Idle;
        }
    }
}

fn push_error(effects: &mut Vec<Effect>, err: impl Into<AppError>) {
    let err: AppError = err.into();
    emit(effects, err.to_notice());
}

fn push_notice(effects: &mut Vec<Effect>, kind: NoticeKind, message: impl Into<String>) {
    emit(effects, Notice::new(kind, message));
}

fn emit(effects: &mut Vec<Effect>, notice: Notice) {
    tracing::warn!(kind = ?notice.kind, "{}", notice.message);
    effects.push(Effect::Notify(notice));
}
