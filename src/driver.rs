//! The per-frame animation driver.
//!
//! [`AnimationDriver`] ties the pieces together: it owns the render
//! buffers, the [`MorphController`], the idle motion, and the sampler, and
//! turns requests into morphs.
//!
//! # Frame loop
//!
//! ```ignore
//! let mut driver = AnimationDriver::new(FieldConfig::default())?;
//! loop {
//!     let now = clock.tick();
//!     driver.observe(&wizard.snapshot(), now);
//!     driver.tick(now);
//!     renderer.upload(driver.field());
//! }
//! ```
//!
//! Each [`tick`](AnimationDriver::tick):
//!
//! 1. Takes a finished text sample if one is ready. Results are applied
//!    only for the latest request; failed samples fall back to a sphere.
//! 2. Fires a deferred request whose delay has passed.
//! 3. Advances the morph, or applies idle sway when settled.
//! 4. Copies the visible positions into the render buffer.
//!
//! # Requests
//!
//! Every shape request gets a fresh [`RequestId`] and supersedes whatever
//! came before: a pending text sample is cancelled, a deferred request is
//! dropped, and a morph in flight continues from where it is toward the
//! new target.

use crate::buffer::{ParticleField, PositionBuffer};
use crate::color::{apply_theme_into, gradient_into, ColorTheme, Rgb};
use crate::config::FieldConfig;
use crate::error::{ConfigError, SampleError};
use crate::font::FontLibrary;
use crate::idle::IdleMotion;
use crate::morph::{MorphController, MorphPhase};
use crate::profile::{plan_for, ProfileInput, WizardStep};
use crate::shape::{sample_sphere_into, ShapeRequest, ShapeSampler};
use crate::task::{RequestId, SampleResult, SampleTask};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Radius of the [`AnimationDriver::explode`] sphere.
pub const EXPLODE_RADIUS: f32 = 20.0;
/// Radius of the [`AnimationDriver::implode`] sphere.
pub const IMPLODE_RADIUS: f32 = 0.5;

/// Summary of one [`AnimationDriver::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub phase: MorphPhase,
    /// Linear morph progress, 1 when idle.
    pub progress: f32,
    /// Request whose morph started during this tick.
    pub started: Option<RequestId>,
}

#[derive(Debug)]
struct Deferred {
    due: f64,
    id: RequestId,
    request: ShapeRequest,
}

/// Owns a particle field and animates it between shapes.
pub struct AnimationDriver {
    config: FieldConfig,
    field: ParticleField,
    morph: MorphController,
    idle: IdleMotion,
    sampler: ShapeSampler,
    rng: SmallRng,
    /// Target buffer for synchronous samples.
    scratch: PositionBuffer,
    /// The shape the field started as; restored by `reset`.
    initial: PositionBuffer,
    latest: RequestId,
    pending: Option<SampleTask>,
    deferred: Option<Deferred>,
    profile: Option<ProfileInput>,
    theme: Option<ColorTheme>,
}

impl AnimationDriver {
    /// Create a driver that loads fonts from the local file system.
    pub fn new(config: FieldConfig) -> Result<Self, ConfigError> {
        Self::with_font_library(config, FontLibrary::default())
    }

    /// Create a driver with a custom font source.
    ///
    /// The field starts idle as a sphere of `initial_radius`, colored white.
    pub fn with_font_library(config: FieldConfig, fonts: FontLibrary) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let count = config.particle_count;

        let mut field = ParticleField::new(count, config.size_range, &mut rng);
        let mut initial = PositionBuffer::zeroed(count);
        sample_sphere_into(config.initial_radius, initial.points_mut(), &mut rng);
        field.positions_mut().copy_from(&initial);

        let morph = MorphController::new(initial.clone(), 0.0).with_ease(config.ease);
        let sampler = ShapeSampler::new(config.sampler_settings(), fonts);

        info!(particles = count, seed = ?config.seed, "animation driver created");

        Ok(Self {
            idle: config.idle_motion(),
            config,
            field,
            morph,
            sampler,
            rng,
            scratch: PositionBuffer::zeroed(count),
            initial,
            latest: RequestId::default(),
            pending: None,
            deferred: None,
            profile: None,
            theme: None,
        })
    }

    /// Advance one frame to `now` (seconds on the host's clock).
    pub fn tick(&mut self, now: f64) -> FrameReport {
        let mut started = self.poll_pending(now);
        if let Some(id) = self.fire_deferred(now) {
            started = Some(id);
        }

        let progress = if self.morph.is_morphing() {
            self.morph.advance(now).progress
        } else {
            self.morph.settle(&self.idle, now);
            1.0
        };
        self.field.positions_mut().copy_from(self.morph.current());

        FrameReport {
            phase: self.morph.phase(),
            progress,
            started,
        }
    }

    /// Morph toward `request`.
    ///
    /// Geometric shapes start morphing immediately; text is sampled on a
    /// worker thread and starts morphing on the tick that picks it up.
    pub fn request_shape(&mut self, request: ShapeRequest, now: f64) -> RequestId {
        let id = self.next_request();
        debug!(id = %id, shape = request.kind(), "shape requested");
        self.start(id, request, now);
        id
    }

    /// Morph to `content` as text. Blank content morphs to the fallback sphere.
    pub fn request_text(&mut self, content: &str, now: f64) -> RequestId {
        if content.trim().is_empty() {
            debug!("blank text requested, using fallback sphere");
            return self.request_shape(self.fallback(), now);
        }
        self.request_shape(
            ShapeRequest::Text {
                content: content.to_string(),
            },
            now,
        )
    }

    /// Issue `request` once `delay` seconds have passed.
    ///
    /// The request is dropped if another arrives first.
    pub fn schedule(&mut self, request: ShapeRequest, delay: f64, now: f64) -> RequestId {
        if delay.is_nan() || delay <= 0.0 {
            return self.request_shape(request, now);
        }
        let id = self.next_request();
        debug!(id = %id, shape = request.kind(), delay, "shape scheduled");
        self.deferred = Some(Deferred {
            due: now + delay,
            id,
            request,
        });
        id
    }

    /// Recolor every particle from `theme`.
    pub fn apply_theme(&mut self, theme: &ColorTheme) {
        apply_theme_into(
            theme,
            self.config.brightness,
            self.field.colors_mut().colors_mut(),
            &mut self.rng,
        );
        debug!(theme = %theme.id, "theme applied");
        self.theme = Some(theme.clone());
    }

    /// Color particles along a linear ramp from `from` to `to` by index.
    pub fn apply_gradient(&mut self, from: Rgb, to: Rgb) {
        gradient_into(from, to, self.field.colors_mut().colors_mut());
        self.theme = None;
    }

    /// React to a new wizard snapshot.
    ///
    /// Only changes since the previous snapshot trigger anything:
    ///
    /// - a new step issues that step's plan
    /// - a new symbol while on the symbol step issues the symbol's solid
    /// - a new name while on the name step issues the text after the
    ///   configured debounce
    /// - a new theme recolors the field
    pub fn observe(&mut self, input: &ProfileInput, now: f64) {
        let prev = self.profile.replace(input.clone());
        let prev = prev.as_ref();

        if input.color_theme.as_ref() != prev.and_then(|p| p.color_theme.as_ref()) {
            if let Some(theme) = &input.color_theme {
                self.apply_theme(theme);
            }
        }

        let step_changed = prev.map_or(true, |p| p.current_step != input.current_step);
        let symbol_changed = prev.map_or(true, |p| p.symbol != input.symbol);
        let name_changed = prev.map_or(true, |p| p.display_name() != input.display_name());

        if step_changed || (input.current_step == WizardStep::Symbol && symbol_changed) {
            let plan = plan_for(input, &self.config);
            info!(step = ?input.current_step, shape = plan.request.kind(), "wizard step plan");
            self.schedule(plan.request, plan.delay, now);
        } else if input.current_step == WizardStep::Name && name_changed {
            let plan = plan_for(input, &self.config);
            self.schedule(plan.request, self.config.name_debounce, now);
        }
    }

    /// Burst outward to a large sphere.
    pub fn explode(&mut self, now: f64) -> RequestId {
        self.request_shape(ShapeRequest::Sphere { radius: EXPLODE_RADIUS }, now)
    }

    /// Collapse to a tiny sphere.
    pub fn implode(&mut self, now: f64) -> RequestId {
        self.request_shape(ShapeRequest::Sphere { radius: IMPLODE_RADIUS }, now)
    }

    /// Jump back to the starting sphere without animating. Colors return
    /// to white and the applied theme is forgotten.
    pub fn reset(&mut self, now: f64) -> RequestId {
        let id = self.next_request();
        self.morph.reset(&self.initial, now);
        self.field.positions_mut().copy_from(&self.initial);
        self.field.colors_mut().colors_mut().fill(Rgb::WHITE.0);
        self.theme = None;
        debug!(id = %id, "field reset");
        id
    }

    /// Block until the pending text sample finishes, then apply it.
    ///
    /// Returns the request that started morphing, if any. Intended for
    /// tools and tests; a frame loop should rely on [`tick`](Self::tick).
    pub fn wait_for_pending(&mut self, now: f64) -> Option<RequestId> {
        let task = self.pending.as_mut()?;
        let result = pollster::block_on(&mut *task);
        let id = task.id();
        self.pending = None;
        self.finish(id, result, now)
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn morph(&self) -> &MorphController {
        &self.morph
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest
    }

    /// Whether a text sample is in flight.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a delayed request is waiting to fire.
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// The last theme applied, if colors came from a theme.
    pub fn theme(&self) -> Option<&ColorTheme> {
        self.theme.as_ref()
    }

    fn next_request(&mut self) -> RequestId {
        if let Some(task) = self.pending.take() {
            debug!(id = %task.id(), "cancelling superseded sample");
            task.cancel();
        }
        if let Some(d) = self.deferred.take() {
            debug!(id = %d.id, "dropping superseded deferred request");
        }
        self.latest = self.latest.next();
        self.latest
    }

    fn fallback(&self) -> ShapeRequest {
        ShapeRequest::Sphere {
            radius: self.config.fallback_radius,
        }
    }

    /// Start sampling `request` for `id`. Returns true when a morph began.
    fn start(&mut self, id: RequestId, request: ShapeRequest, now: f64) -> bool {
        if request.is_async() {
            let seed = self.rng.gen();
            self.pending = Some(self.sampler.spawn(id, request, self.field.count(), seed));
            return false;
        }

        match self.sampler.sample_into(&request, &mut self.scratch, &mut self.rng) {
            Ok(()) => self.morph.begin_morph(&self.scratch, self.config.morph_duration, now),
            Err(e) => {
                warn!(id = %id, error = %e, "sampling failed, falling back to sphere");
                self.morph_to_fallback(now);
            }
        }
        true
    }

    fn morph_to_fallback(&mut self, now: f64) {
        sample_sphere_into(self.config.fallback_radius, self.scratch.points_mut(), &mut self.rng);
        self.morph.begin_morph(&self.scratch, self.config.morph_duration, now);
    }

    fn poll_pending(&mut self, now: f64) -> Option<RequestId> {
        let task = self.pending.as_mut()?;
        let result = task.try_take()?;
        let id = task.id();
        self.pending = None;
        self.finish(id, result, now)
    }

    fn finish(&mut self, id: RequestId, result: SampleResult, now: f64) -> Option<RequestId> {
        if id != self.latest {
            warn!(id = %id, latest = %self.latest, "discarding stale sample");
            return None;
        }
        match result {
            Ok(buffer) => {
                self.morph.begin_morph(&buffer, self.config.morph_duration, now);
            }
            Err(SampleError::Cancelled) => {
                debug!(id = %id, "sample cancelled");
                return None;
            }
            Err(e) => {
                warn!(id = %id, error = %e, "text sampling failed, falling back to sphere");
                self.morph_to_fallback(now);
            }
        }
        Some(id)
    }

    fn fire_deferred(&mut self, now: f64) -> Option<RequestId> {
        if !self.deferred.as_ref().is_some_and(|d| now >= d.due) {
            return None;
        }
        let Deferred { id, request, .. } = self.deferred.take()?;
        debug!(id = %id, shape = request.kind(), "deferred request due");
        self.start(id, request, now).then_some(id)
    }
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("particles", &self.field.count())
            .field("phase", &self.morph.phase())
            .field("latest", &self.latest)
            .field("pending", &self.pending)
            .field("deferred", &self.deferred)
            .finish()
    }
}
