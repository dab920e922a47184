//! Rotation controller.
//!
//! Owns the selected index, the auto-advance timer and the fade between the
//! displayed asset and the next one. The host drives it once per frame through
//! [`Carousel::update`] and reads [`Carousel::displayed`] and
//! [`Carousel::opacity`] back to draw. Selection and display are decoupled:
//! the index and indicators follow every request at once, while the displayed
//! asset only changes once the target has actually loaded.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::asset::AssetRef;
use crate::asset_list::AssetList;
use crate::constants::*;
use crate::preload::{LoadOutcome, PendingLoad, Preload};
use crate::state::{CarouselState, FadePhase};

/// Durations used by the controller, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub interval: f32,
    pub fade: f32,
    pub settle: f32,
}

impl Timing {
    pub fn new(interval: Duration, fade: Duration) -> Self {
        Self {
            interval: interval.as_secs_f32(),
            fade: fade.as_secs_f32(),
            settle: SETTLE_DELAY,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(Duration::from_millis(INTERVAL_MS), Duration::from_millis(FADE_MS))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn offset(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// One position marker per asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub index: usize,
    pub active: bool,
}

struct InFlightLoad {
    sequence: u64,
    target: AssetRef,
    pending: PendingLoad,
}

pub struct Carousel<L: Preload> {
    loader: L,
    timing: Timing,
    state: CarouselState,

    assets: AssetList,
    current_index: usize,
    indicators: Vec<Indicator>,

    // Seconds since the last tick; `None` when stopped.
    timer: Option<f32>,

    // Bumped on every index change. Only the latest request may touch the display.
    sequence: u64,
    load: Option<InFlightLoad>,

    displayed: Option<AssetRef>,
    opacity: f32,
    phase: FadePhase,
}

impl<L: Preload> Carousel<L> {
    pub fn new(loader: L, timing: Timing) -> Self {
        Self {
            loader,
            timing,
            state: CarouselState::Uninitialized,
            assets: AssetList::default(),
            current_index: 0,
            indicators: Vec::new(),
            timer: None,
            sequence: 0,
            load: None,
            displayed: None,
            opacity: 1.0,
            phase: FadePhase::Idle,
        }
    }

    /// Shows the first asset without a fade, builds the indicators and starts
    /// the timer. An empty list, or a controller that is already initialized,
    /// is left untouched.
    pub fn initialize(&mut self, assets: AssetList) {
        if self.state != CarouselState::Uninitialized {
            warn!(state = ?self.state, "initialize ignored");
            return;
        }
        let Some(first) = assets.get(0).cloned() else {
            debug!("initialize ignored: empty asset list");
            return;
        };

        self.current_index = 0;
        self.displayed = Some(first);
        self.opacity = 1.0;
        self.indicators = (0..assets.len())
            .map(|index| Indicator { index, active: index == 0 })
            .collect();
        self.assets = assets;
        self.state = CarouselState::Ready;
        self.start_timer();

        info!(assets = self.assets.len(), "carousel ready");
    }

    /// Moves one step with wraparound. Does not touch the timer.
    pub fn advance(&mut self, direction: Direction) {
        if !self.is_ready() {
            return;
        }
        let len = self.assets.len() as isize;
        let target = (self.current_index as isize + direction.offset()).rem_euclid(len) as usize;
        self.show(target);
    }

    /// Selects `index` as given. Out-of-range targets are ignored.
    pub fn jump_to(&mut self, index: usize) {
        if !self.is_ready() {
            return;
        }
        if index >= self.assets.len() {
            warn!(index, len = self.assets.len(), "jump target out of range");
            return;
        }
        self.show(index);
    }

    pub fn next(&mut self) {
        self.advance(Direction::Forward);
        self.restart_timer();
    }

    pub fn prev(&mut self) {
        self.advance(Direction::Backward);
        self.restart_timer();
    }

    /// Indicator activation.
    pub fn select(&mut self, index: usize) {
        self.jump_to(index);
        self.restart_timer();
    }

    pub fn start_timer(&mut self) {
        if self.is_ready() && self.timer.is_none() {
            self.timer = Some(0.0);
        }
    }

    pub fn stop_timer(&mut self) {
        self.timer = None;
    }

    pub fn restart_timer(&mut self) {
        self.stop_timer();
        self.start_timer();
    }

    pub fn pointer_enter(&mut self) {
        self.stop_timer();
    }

    pub fn pointer_leave(&mut self) {
        self.start_timer();
    }

    /// Advances time by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !self.is_ready() {
            return;
        }
        self.poll_load();
        self.step_fade(dt);
        self.tick_timer(dt);
    }

    /// Stops the timer and drops any outstanding load. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.state == CarouselState::Disposed {
            return;
        }
        self.stop_timer();
        self.load = None;
        self.phase = FadePhase::Idle;
        self.state = CarouselState::Disposed;
        debug!("carousel disposed");
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn assets(&self) -> &AssetList {
        &self.assets
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn displayed(&self) -> Option<&AssetRef> {
        self.displayed.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn transition_in_flight(&self) -> bool {
        self.load.is_some() || self.phase != FadePhase::Idle
    }

    fn is_ready(&self) -> bool {
        self.state == CarouselState::Ready
    }

    fn show(&mut self, index: usize) {
        self.current_index = index;
        for indicator in &mut self.indicators {
            indicator.active = indicator.index == index;
        }

        self.sequence += 1;
        let target = self.assets[index].clone();
        let pending = self.loader.preload(&target);
        // Replacing the previous load drops its receiver, so its result is never seen.
        self.load = Some(InFlightLoad { sequence: self.sequence, target, pending });
    }

    fn poll_load(&mut self) {
        let Some(outcome) = self.load.as_mut().and_then(|load| load.pending.poll()) else {
            return;
        };
        let Some(load) = self.load.take() else {
            return;
        };

        match outcome {
            LoadOutcome::Failed => {
                debug!(asset = %load.target, "preload failed, keeping current asset");
            }
            LoadOutcome::Loaded
                if self.phase == FadePhase::Idle && self.displayed.as_ref() == Some(&load.target) =>
            {
                trace!(asset = %load.target, "already displayed");
            }
            LoadOutcome::Loaded => {
                self.phase = FadePhase::FadingOut {
                    sequence: load.sequence,
                    target: load.target,
                    from: self.opacity,
                    elapsed: 0.0,
                };
            }
        }
    }

    fn step_fade(&mut self, dt: f32) {
        let fade = self.timing.fade;
        let next = match &mut self.phase {
            FadePhase::Idle => None,
            FadePhase::FadingOut { sequence, target, from, elapsed } => {
                *elapsed += dt;
                let t = progress(*elapsed, fade);
                self.opacity = *from * (1.0 - t);
                if t < 1.0 {
                    None
                } else {
                    if *sequence == self.sequence {
                        self.displayed = Some(target.clone());
                    } else {
                        trace!(asset = %target, "superseded before swap");
                    }
                    Some(FadePhase::Settling { elapsed: 0.0 })
                }
            }
            FadePhase::Settling { elapsed } => {
                *elapsed += dt;
                self.opacity = 0.0;
                (*elapsed >= self.timing.settle).then_some(FadePhase::FadingIn { elapsed: 0.0 })
            }
            FadePhase::FadingIn { elapsed } => {
                *elapsed += dt;
                let t = progress(*elapsed, fade);
                self.opacity = t;
                (t >= 1.0).then_some(FadePhase::Idle)
            }
        };

        if let Some(phase) = next {
            self.phase = phase;
        }
    }

    fn tick_timer(&mut self, dt: f32) {
        let interval = self.timing.interval;
        if interval <= 0.0 {
            return;
        }
        let Some(elapsed) = self.timer.as_mut() else {
            return;
        };

        if !dt.is_finite() {
            return;
        }
        *elapsed += dt;
        if *elapsed < interval {
            return;
        }

        let ticks = (*elapsed / interval).floor();
        *elapsed %= interval;

        // Whole laps land on the same asset; only the remainder moves.
        let len = self.assets.len();
        if len == 0 {
            return;
        }
        let steps = (ticks % len as f32) as usize;
        self.show((self.current_index + steps) % len);
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use tokio::sync::oneshot;

    /// Settles every preload immediately unless told to hold them back.
    #[derive(Clone, Default)]
    struct ScriptedLoader {
        failing: Rc<RefCell<HashSet<AssetRef>>>,
        hold: Rc<RefCell<bool>>,
        held: Rc<RefCell<Vec<(AssetRef, oneshot::Sender<LoadOutcome>)>>>,
        requested: Rc<RefCell<Vec<AssetRef>>>,
    }

    impl ScriptedLoader {
        fn fail(&self, asset: &str) {
            self.failing.borrow_mut().insert(AssetRef::from(asset));
        }

        fn hold(&self) {
            *self.hold.borrow_mut() = true;
        }

        fn release(&self, asset: &str, outcome: LoadOutcome) {
            let mut held = self.held.borrow_mut();
            let position = held.iter().position(|(a, _)| a.as_str() == asset).unwrap();
            let (_, tx) = held.remove(position);
            let _ = tx.send(outcome);
        }
    }

    impl Preload for ScriptedLoader {
        fn preload(&self, asset: &AssetRef) -> PendingLoad {
            self.requested.borrow_mut().push(asset.clone());
            if *self.hold.borrow() {
                let (tx, pending) = PendingLoad::channel();
                self.held.borrow_mut().push((asset.clone(), tx));
                return pending;
            }
            if self.failing.borrow().contains(asset) {
                PendingLoad::settled(LoadOutcome::Failed)
            } else {
                PendingLoad::settled(LoadOutcome::Loaded)
            }
        }
    }

    fn timing() -> Timing {
        Timing { interval: 5.0, fade: 0.2, settle: 0.06 }
    }

    fn list(n: usize) -> AssetList {
        let assets: Vec<AssetRef> = (1..=n).map(|i| AssetRef::new(format!("archives/{i}.jpg"))).collect();
        AssetList::build(&assets, &[], AssetRef::from("archives/1.jpg"))
    }

    fn ready(n: usize) -> (Carousel<ScriptedLoader>, ScriptedLoader) {
        let loader = ScriptedLoader::default();
        let mut carousel = Carousel::new(loader.clone(), timing());
        carousel.initialize(list(n));
        (carousel, loader)
    }

    fn active(carousel: &Carousel<ScriptedLoader>) -> Vec<usize> {
        carousel.indicators().iter().filter(|i| i.active).map(|i| i.index).collect()
    }

    /// Long enough for fade-out, settle and fade-in, short of a timer tick.
    fn finish_transition(carousel: &mut Carousel<ScriptedLoader>) {
        for _ in 0..20 {
            carousel.update(0.05);
        }
    }

    #[test]
    fn initialize_shows_first_asset_without_fade() {
        let (carousel, loader) = ready(3);
        assert_eq!(carousel.state(), CarouselState::Ready);
        assert_eq!(carousel.current_index(), 0);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/1.jpg")));
        assert_eq!(carousel.opacity(), 1.0);
        assert_eq!(carousel.indicators().len(), 3);
        assert_eq!(active(&carousel), vec![0]);
        assert!(carousel.is_timer_running());
        assert!(!carousel.transition_in_flight());
        assert!(loader.requested.borrow().is_empty());
    }

    #[test]
    fn initialize_with_empty_list_is_a_no_op() {
        let mut carousel = Carousel::new(ScriptedLoader::default(), timing());
        carousel.initialize(AssetList::default());
        assert_eq!(carousel.state(), CarouselState::Uninitialized);
        assert!(carousel.displayed().is_none());
        assert!(!carousel.is_timer_running());
    }

    #[test]
    fn controls_before_initialize_do_nothing() {
        let loader = ScriptedLoader::default();
        let mut carousel = Carousel::new(loader.clone(), timing());
        carousel.next();
        carousel.select(2);
        carousel.pointer_leave();
        carousel.update(10.0);
        assert!(!carousel.is_timer_running());
        assert!(loader.requested.borrow().is_empty());
    }

    #[test]
    fn forward_wraps_back_to_start_and_backward_inverts() {
        let (mut carousel, _) = ready(4);
        carousel.jump_to(2);
        for _ in 0..4 {
            carousel.advance(Direction::Forward);
        }
        assert_eq!(carousel.current_index(), 2);

        carousel.advance(Direction::Forward);
        carousel.advance(Direction::Backward);
        assert_eq!(carousel.current_index(), 2);

        carousel.jump_to(0);
        carousel.advance(Direction::Backward);
        assert_eq!(carousel.current_index(), 3);
    }

    #[test]
    fn jump_marks_exactly_one_indicator() {
        let (mut carousel, loader) = ready(5);
        loader.fail("archives/4.jpg");

        carousel.jump_to(3);
        assert_eq!(carousel.current_index(), 3);
        assert_eq!(active(&carousel), vec![3]);

        carousel.update(0.01);
        assert_eq!(active(&carousel), vec![3]);

        carousel.jump_to(1);
        assert_eq!(active(&carousel), vec![1]);
    }

    #[test]
    fn out_of_range_jump_is_ignored() {
        let (mut carousel, loader) = ready(2);
        carousel.jump_to(2);
        assert_eq!(carousel.current_index(), 0);
        assert!(loader.requested.borrow().is_empty());
    }

    #[test]
    fn successful_load_fades_then_swaps() {
        let (mut carousel, _) = ready(3);
        carousel.next();
        assert!(carousel.transition_in_flight());

        carousel.update(0.1);
        assert!(carousel.opacity() < 1.0);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/1.jpg")));

        carousel.update(0.15);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/2.jpg")));
        assert_eq!(carousel.opacity(), 0.0);

        finish_transition(&mut carousel);
        assert_eq!(carousel.opacity(), 1.0);
        assert!(!carousel.transition_in_flight());
    }

    #[test]
    fn failed_load_keeps_display_but_moves_selection() {
        let (mut carousel, loader) = ready(3);
        loader.fail("archives/2.jpg");

        carousel.next();
        finish_transition(&mut carousel);

        assert_eq!(carousel.current_index(), 1);
        assert_eq!(active(&carousel), vec![1]);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/1.jpg")));
        assert_eq!(carousel.opacity(), 1.0);
        assert!(!carousel.transition_in_flight());
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let (mut carousel, loader) = ready(3);
        loader.hold();

        carousel.jump_to(1);
        carousel.jump_to(2);
        loader.release("archives/2.jpg", LoadOutcome::Loaded);
        loader.release("archives/3.jpg", LoadOutcome::Failed);
        finish_transition(&mut carousel);

        assert_eq!(carousel.current_index(), 2);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/1.jpg")));
    }

    #[test]
    fn fade_superseded_before_swap_keeps_old_asset() {
        let (mut carousel, loader) = ready(3);

        carousel.jump_to(1);
        carousel.update(0.1); // fading out towards 2.jpg

        loader.hold();
        carousel.jump_to(2); // still pending when the fade reaches its swap point
        finish_transition(&mut carousel);

        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/1.jpg")));
        assert_eq!(carousel.opacity(), 1.0);

        loader.release("archives/3.jpg", LoadOutcome::Loaded);
        finish_transition(&mut carousel);
        assert_eq!(carousel.displayed(), Some(&AssetRef::from("archives/3.jpg")));
    }

    #[test]
    fn timer_ticks_once_per_interval() {
        let (mut carousel, _) = ready(10);
        for _ in 0..30 {
            carousel.update(0.5);
        }
        // 15 seconds at a 5 second period.
        assert_eq!(carousel.current_index(), 3);
    }

    #[test]
    fn long_frames_advance_by_the_elapsed_intervals() {
        let (mut carousel, _) = ready(4);
        carousel.update(11.0);
        assert_eq!(carousel.current_index(), 2);
        carousel.update(4.0);
        assert_eq!(carousel.current_index(), 3);

        // Returns at once; at this magnitude the tick count is a whole number of laps.
        carousel.update(1e12);
        assert_eq!(carousel.current_index(), 3);
        assert!(carousel.is_timer_running());

        carousel.update(f32::INFINITY);
        assert_eq!(carousel.current_index(), 3);
        carousel.update(5.0);
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn starting_a_running_timer_keeps_its_cadence() {
        let (mut carousel, _) = ready(10);
        carousel.update(4.0);
        carousel.start_timer();
        carousel.update(1.0);
        assert_eq!(carousel.current_index(), 1);
    }

    #[test]
    fn manual_navigation_resets_the_countdown() {
        let (mut carousel, _) = ready(10);
        carousel.update(4.0);
        carousel.next();
        assert_eq!(carousel.current_index(), 1);

        carousel.update(4.5);
        assert_eq!(carousel.current_index(), 1);

        carousel.update(0.5);
        assert_eq!(carousel.current_index(), 2);
    }

    #[test]
    fn indicator_selection_resets_the_countdown() {
        let (mut carousel, _) = ready(10);
        carousel.update(4.5);
        carousel.select(7);
        carousel.update(4.5);
        assert_eq!(carousel.current_index(), 7);
    }

    #[test]
    fn hover_pauses_and_leave_resumes() {
        let (mut carousel, _) = ready(4);
        carousel.pointer_enter();
        assert!(!carousel.is_timer_running());
        carousel.update(20.0);
        assert_eq!(carousel.current_index(), 0);

        carousel.pointer_enter();
        carousel.pointer_leave();
        assert!(carousel.is_timer_running());
        carousel.update(5.0);
        assert_eq!(carousel.current_index(), 1);
    }

    #[test]
    fn single_asset_rotation_does_not_flicker() {
        let (mut carousel, loader) = ready(1);
        carousel.update(5.0);
        carousel.update(0.05);
        assert_eq!(carousel.current_index(), 0);
        assert_eq!(loader.requested.borrow().len(), 1);
        assert_eq!(carousel.opacity(), 1.0);
        assert!(!carousel.transition_in_flight());
    }

    #[test]
    fn dispose_stops_everything() {
        let (mut carousel, loader) = ready(3);
        loader.hold();
        carousel.next();
        carousel.dispose();

        assert_eq!(carousel.state(), CarouselState::Disposed);
        assert!(!carousel.is_timer_running());
        assert!(!carousel.transition_in_flight());

        carousel.pointer_leave();
        carousel.next();
        carousel.update(10.0);
        assert!(!carousel.is_timer_running());
        assert_eq!(carousel.current_index(), 1);
    }

    #[test]
    fn instances_are_independent() {
        let (mut first, _) = ready(3);
        let (mut second, _) = ready(3);
        first.next();
        second.pointer_enter();
        second.update(10.0);
        assert_eq!(first.current_index(), 1);
        assert_eq!(second.current_index(), 0);
    }
}
