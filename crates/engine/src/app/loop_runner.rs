use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::Config;

use super::input::KeyState;
use super::metrics::MetricsAccumulator;
use super::rendering::FrameRenderer;

pub const DEFAULT_UPDATES_PER_SECOND: u32 = 120;

/// Host hooks driven by the loop. `initialize` and `terminate` run exactly
/// once, on the loop thread, around the run. `check_input` and `update_game`
/// run once per fixed step; `render_game` once per outer iteration.
///
/// `pause` and `resume` are capability hooks with no-op defaults; the core
/// never invokes them, hosts opt in from their own state handling.
///
/// A panic in any hook is fatal to the loop thread; hooks are not retried.
pub trait Game: Send {
    fn initialize(&mut self);
    fn terminate(&mut self);
    fn check_input(&mut self, input: &KeyState, control: &LoopControl);
    fn update_game(&mut self, input: &KeyState);
    fn render_game(&mut self, renderer: &mut FrameRenderer);
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Fixed simulation rate in updates per second.
    pub updates_per_second: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            updates_per_second: DEFAULT_UPDATES_PER_SECOND,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    /// Seeds the update rate from the `updateInterval` config key. A missing
    /// or unparsable value falls back to the default rate; zero is lifted to
    /// one rather than dividing by it.
    pub fn from_config(config: &Config) -> Self {
        Self {
            updates_per_second: config
                .get_u32_or("updateInterval", DEFAULT_UPDATES_PER_SECOND)
                .max(1),
            ..Self::default()
        }
    }

    pub fn step_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.updates_per_second.max(1) as u64)
    }
}

/// Accumulator state for the fixed-timestep drain.
///
/// Deliberately unclamped: after a long stall the next [`advance`] reports a
/// burst of steps instead of silently dropping backlog. Whether to tolerate
/// that burst is the host's tradeoff, not corrected here.
///
/// [`advance`]: FrameClock::advance
#[derive(Debug)]
pub struct FrameClock {
    last_time: Instant,
    accumulator: Duration,
    step: Duration,
}

impl FrameClock {
    pub fn new(step: Duration, now: Instant) -> Self {
        Self {
            last_time: now,
            accumulator: Duration::ZERO,
            step,
        }
    }

    /// Adds the elapsed time since the previous call and drains whole steps,
    /// returning how many update steps to run. Afterwards the residual
    /// accumulator is always in `[0, step)`.
    pub fn advance(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.last_time);
        self.last_time = now;
        self.accumulator = self.accumulator.saturating_add(elapsed);

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

/// Cooperative stop flag shared between the loop thread and whoever holds a
/// handle. Stopping never preempts an in-flight update or render; the flag is
/// consulted once per outer iteration.
#[derive(Debug, Clone)]
pub struct LoopControl {
    running: Arc<AtomicBool>,
}

impl LoopControl {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            info!("loop stop requested");
        }
    }
}

/// Owner of the loop thread. Dropping the handle does not stop the loop;
/// call [`stop`](Self::stop) and then [`join`](Self::join).
pub struct LoopHandle {
    control: LoopControl,
    thread: JoinHandle<()>,
}

impl LoopHandle {
    pub fn control(&self) -> LoopControl {
        self.control.clone()
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Fixed-timestep scheduler: a variable number of update steps per outer
/// iteration, exactly one render, simulation cadence decoupled from
/// presentation cadence.
pub struct GameLoop<G: Game> {
    game: G,
    renderer: FrameRenderer,
    input: KeyState,
    step: Duration,
    metrics_log_interval: Duration,
    control: LoopControl,
}

impl<G: Game + 'static> GameLoop<G> {
    pub fn new(config: &LoopConfig, renderer: FrameRenderer, input: KeyState, game: G) -> Self {
        Self {
            game,
            renderer,
            input,
            step: config.step_duration(),
            metrics_log_interval: config.metrics_log_interval,
            control: LoopControl::new(),
        }
    }

    /// Transitions `Stopped -> Running`: spawns the dedicated loop thread and
    /// returns the handle used to stop and join it.
    pub fn start(self) -> std::io::Result<LoopHandle> {
        self.control.running.store(true, Ordering::Relaxed);
        let control = self.control.clone();
        let thread = thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || self.run())?;
        Ok(LoopHandle { control, thread })
    }

    fn run(mut self) {
        info!(
            step_us = self.step.as_micros() as u64,
            "game loop starting"
        );
        self.game.initialize();

        let mut clock = FrameClock::new(self.step, Instant::now());
        let mut metrics = MetricsAccumulator::new(self.metrics_log_interval);
        let mut last_frame_instant = Instant::now();

        while self.control.is_running() {
            let now = Instant::now();
            let frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;

            let steps = clock.advance(now);
            for _ in 0..steps {
                self.game.check_input(&self.input, &self.control);
                self.game.update_game(&self.input);
            }
            // One snapshot per outer iteration, after the drain, so the next
            // iteration's edges reflect this frame's terminal key state.
            self.input.advance();

            self.renderer.begin_render();
            self.game.render_game(&mut self.renderer);
            if let Err(error) = self.renderer.end_render() {
                warn!(error = %error, "present failed; stopping loop");
                self.control.stop();
            }

            metrics.record_frame(frame_dt);
            metrics.record_ticks(steps.min(u32::MAX as u64) as u32);
            if let Some(snapshot) = metrics.maybe_snapshot(now) {
                info!(
                    fps = snapshot.fps,
                    tps = snapshot.tps,
                    frame_time_ms = snapshot.frame_time_ms,
                    "loop_metrics"
                );
            }
        }

        self.game.terminate();
        info!("game loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::super::rendering::{PresentError, Surface};
    use super::*;

    #[test]
    fn drain_preserves_elapsed_time_exactly() {
        let step = Duration::from_nanos(8_333_333);
        let base = Instant::now();
        let mut clock = FrameClock::new(step, base);

        let deltas_ms = [3u64, 17, 0, 42, 9, 1, 250, 8];
        let mut now = base;
        let mut total_steps = 0u64;
        for delta in deltas_ms {
            now += Duration::from_millis(delta);
            total_steps += clock.advance(now);
            assert!(clock.accumulator() < step);
        }

        let total_elapsed: Duration = deltas_ms.iter().map(|ms| Duration::from_millis(*ms)).sum();
        assert_eq!(step * total_steps as u32 + clock.accumulator(), total_elapsed);
    }

    #[test]
    fn fifty_ms_at_120_hz_drains_six_steps() {
        let config = LoopConfig {
            updates_per_second: 120,
            ..LoopConfig::default()
        };
        let base = Instant::now();
        let mut clock = FrameClock::new(config.step_duration(), base);

        let steps = clock.advance(base + Duration::from_millis(50));

        assert_eq!(steps, 6);
        // 6 * 8_333_333 ns leaves a 2 ns residue of the 50 ms.
        assert_eq!(clock.accumulator(), Duration::from_nanos(2));
    }

    #[test]
    fn update_count_over_a_second_is_within_one_of_the_rate() {
        let rate = 120u64;
        let step = Duration::from_nanos(1_000_000_000 / rate);
        let base = Instant::now();
        let mut clock = FrameClock::new(step, base);

        // Uneven 7 ms frames covering one second of wall time.
        let mut now = base;
        let mut steps = 0u64;
        for _ in 0..143 {
            now += Duration::from_millis(7);
            steps += clock.advance(now);
        }

        let covered_seconds = (143.0 * 7.0) / 1000.0;
        let expected = (covered_seconds * rate as f64).round() as i64;
        assert!((steps as i64 - expected).abs() <= 1);
    }

    #[test]
    fn sub_step_elapsed_time_runs_zero_updates() {
        let step = Duration::from_millis(10);
        let base = Instant::now();
        let mut clock = FrameClock::new(step, base);

        assert_eq!(clock.advance(base + Duration::from_millis(4)), 0);
        assert_eq!(clock.accumulator(), Duration::from_millis(4));
        // The residue carries into the next iteration.
        assert_eq!(clock.advance(base + Duration::from_millis(12)), 1);
        assert_eq!(clock.accumulator(), Duration::from_millis(2));
    }

    #[test]
    fn stall_produces_an_unclamped_burst() {
        let step = Duration::from_nanos(8_333_333);
        let base = Instant::now();
        let mut clock = FrameClock::new(step, base);

        let steps = clock.advance(base + Duration::from_secs(1));
        assert_eq!(steps, 120);
    }

    #[test]
    fn step_duration_from_update_interval() {
        let config = LoopConfig::from_config(&Config::parse("updateInterval=120\n"));
        assert_eq!(config.step_duration(), Duration::from_nanos(8_333_333));

        let fallback = LoopConfig::from_config(&Config::parse("updateInterval=abc\n"));
        assert_eq!(fallback.updates_per_second, DEFAULT_UPDATES_PER_SECOND);

        let floored = LoopConfig::from_config(&Config::parse("updateInterval=0\n"));
        assert_eq!(floored.updates_per_second, 1);
    }

    struct NullSurface;

    impl Surface for NullSurface {
        fn width(&self) -> u32 {
            64
        }

        fn height(&self) -> u32 {
            64
        }

        fn frame_mut(&mut self) -> Option<&mut [u8]> {
            None
        }

        fn present(&mut self) -> Result<(), PresentError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counters {
        initializes: AtomicU32,
        updates: AtomicU32,
        renders: AtomicU32,
        terminates: AtomicU32,
    }

    struct CountingGame {
        counters: Arc<Counters>,
        stop_after_updates: u32,
    }

    impl Game for CountingGame {
        fn initialize(&mut self) {
            self.counters.initializes.fetch_add(1, Ordering::Relaxed);
        }

        fn terminate(&mut self) {
            self.counters.terminates.fetch_add(1, Ordering::Relaxed);
        }

        fn check_input(&mut self, _input: &KeyState, control: &LoopControl) {
            if self.counters.updates.load(Ordering::Relaxed) >= self.stop_after_updates {
                control.stop();
            }
        }

        fn update_game(&mut self, _input: &KeyState) {
            self.counters.updates.fetch_add(1, Ordering::Relaxed);
        }

        fn render_game(&mut self, _renderer: &mut FrameRenderer) {
            self.counters.renders.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn loop_runs_hooks_and_stops_cooperatively() {
        let counters = Arc::new(Counters::default());
        let game = CountingGame {
            counters: Arc::clone(&counters),
            stop_after_updates: 5,
        };
        let (input, _events) = KeyState::new();
        let renderer = FrameRenderer::new(Box::new(NullSurface));
        let config = LoopConfig {
            updates_per_second: 1000,
            ..LoopConfig::default()
        };

        let handle = GameLoop::new(&config, renderer, input, game)
            .start()
            .expect("spawn loop thread");
        handle.join().expect("loop thread exits cleanly");

        assert_eq!(counters.initializes.load(Ordering::Relaxed), 1);
        assert_eq!(counters.terminates.load(Ordering::Relaxed), 1);
        assert!(counters.updates.load(Ordering::Relaxed) >= 5);
        assert!(counters.renders.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn external_stop_ends_the_loop() {
        let counters = Arc::new(Counters::default());
        let game = CountingGame {
            counters: Arc::clone(&counters),
            stop_after_updates: u32::MAX,
        };
        let (input, _events) = KeyState::new();
        let renderer = FrameRenderer::new(Box::new(NullSurface));

        let handle = GameLoop::new(&LoopConfig::default(), renderer, input, game)
            .start()
            .expect("spawn loop thread");
        assert!(handle.is_running());

        handle.stop();
        handle.join().expect("loop thread exits cleanly");
        assert_eq!(counters.terminates.load(Ordering::Relaxed), 1);
    }
}
