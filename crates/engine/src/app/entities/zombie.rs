use std::time::Duration;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{EntityId, Living, Passability, UpdateContext, Vitals};
use crate::app::events::EventPayload;
use crate::app::primitives::{Direction, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZombieMode {
    Wander,
    Chase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZombieTuning {
    pub max_hp: i32,
    pub step_size: i32,
    pub move_interval: Duration,
    pub chase_radius: i32,
    pub contact_range: i32,
    pub contact_damage: i32,
    pub attack_cooldown: Duration,
}

impl Default for ZombieTuning {
    fn default() -> Self {
        Self {
            max_hp: 30,
            step_size: 5,
            move_interval: Duration::from_millis(150),
            chase_radius: 50,
            contact_range: 10,
            contact_damage: 5,
            attack_cooldown: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zombie {
    vitals: Vitals,
    tuning: ZombieTuning,
    heading: Direction,
    mode: ZombieMode,
    since_move: Duration,
    cooldown_left: Duration,
}

impl Zombie {
    pub fn new(tuning: ZombieTuning) -> Self {
        Self {
            vitals: Vitals::full(tuning.max_hp),
            tuning,
            heading: Direction::Down,
            mode: ZombieMode::Wander,
            since_move: Duration::ZERO,
            cooldown_left: Duration::ZERO,
        }
    }

    pub fn with_heading(mut self, heading: Direction) -> Self {
        self.heading = heading;
        self
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn mode(&self) -> ZombieMode {
        self.mode
    }

    pub(super) fn sprite_state(&self) -> String {
        if self.is_alive() {
            format!("walking_{}", self.heading.as_str())
        } else {
            "dead".to_string()
        }
    }

    pub(super) fn update(&mut self, id: &EntityId, pos: &mut Pos, ctx: &mut UpdateContext<'_>) {
        if !self.is_alive() {
            return;
        }
        self.cooldown_left = self.cooldown_left.saturating_sub(ctx.dt);
        self.since_move = self.since_move.saturating_add(ctx.dt);

        let target = ctx.target;
        let mode = match target {
            Some(target) if pos.chebyshev(target.pos) <= self.tuning.chase_radius => {
                ZombieMode::Chase
            }
            _ => ZombieMode::Wander,
        };
        if mode != self.mode {
            debug!(entity_id = %id, from = ?self.mode, to = ?mode, "zombie_mode_changed");
            self.mode = mode;
        }

        if self.since_move >= self.tuning.move_interval {
            self.since_move = Duration::ZERO;
            match (mode, target) {
                (ZombieMode::Chase, Some(target)) => {
                    if !self.chase_step(pos, target.pos, ctx.world) {
                        self.wander_step(pos, ctx.world, ctx.rng);
                    }
                }
                _ => self.wander_step(pos, ctx.world, ctx.rng),
            }
        }

        if let Some(target) = target {
            let in_contact = pos.chebyshev(target.pos) < self.tuning.contact_range;
            if in_contact && self.cooldown_left.is_zero() {
                ctx.bus.post(EventPayload::EntityDamaged {
                    target_id: target.id.clone(),
                    source_id: id.clone(),
                    amount: self.tuning.contact_damage,
                });
                self.cooldown_left = self.tuning.attack_cooldown;
            }
        }
    }

    /// One greedy step toward `target`. Each non-zero axis gap shrinks by up
    /// to `step_size`, so Chebyshev distance strictly drops on an open field.
    /// When that square is blocked, single-axis moves that close distance
    /// are tried with the current heading first. Returns false when stuck.
    pub fn chase_step(&mut self, pos: &mut Pos, target: Pos, world: &dyn Passability) -> bool {
        let dx = target.x - pos.x;
        let dy = target.y - pos.y;
        if dx == 0 && dy == 0 {
            return true;
        }
        let step = self.tuning.step_size.max(1);
        let sx = dx.signum() * dx.abs().min(step);
        let sy = dy.signum() * dy.abs().min(step);

        let combined = pos.offset(sx, sy);
        if world.is_passable(combined.x, combined.y) {
            *pos = combined;
            self.heading = self.preferred_heading(sx, sy);
            return true;
        }

        let mut options: Vec<(Direction, i32, i32)> = Vec::with_capacity(2);
        if sx != 0 {
            let direction = if sx > 0 { Direction::Right } else { Direction::Left };
            options.push((direction, sx, 0));
        }
        if sy != 0 {
            let direction = if sy > 0 { Direction::Down } else { Direction::Up };
            options.push((direction, 0, sy));
        }
        options.sort_by_key(|(direction, _, _)| *direction != self.heading);

        for (direction, ox, oy) in options {
            let candidate = pos.offset(ox, oy);
            if world.is_passable(candidate.x, candidate.y) {
                *pos = candidate;
                self.heading = direction;
                return true;
            }
        }
        false
    }

    /// Keeps walking the current heading until blocked, then turns to a random
    /// open direction. When every direction is blocked the zombie stays put.
    pub fn wander_step(&mut self, pos: &mut Pos, world: &dyn Passability, rng: &mut ChaCha8Rng) {
        let step = self.tuning.step_size.max(1);
        let ahead = step_toward(*pos, self.heading, step);
        if world.is_passable(ahead.x, ahead.y) {
            *pos = ahead;
            return;
        }

        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        for direction in directions {
            if direction == self.heading {
                continue;
            }
            let candidate = step_toward(*pos, direction, step);
            if world.is_passable(candidate.x, candidate.y) {
                self.heading = direction;
                *pos = candidate;
                return;
            }
        }
    }

    fn preferred_heading(&self, sx: i32, sy: i32) -> Direction {
        let (hx, hy) = self.heading.delta();
        let keeps_closing = (hx != 0 && hx.signum() == sx.signum()) || (hy != 0 && hy.signum() == sy.signum());
        if keeps_closing {
            return self.heading;
        }
        if sx.abs() >= sy.abs() {
            if sx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if sy > 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

fn step_toward(pos: Pos, direction: Direction, step: i32) -> Pos {
    let (dx, dy) = direction.delta();
    pos.offset(dx * step, dy * step)
}

impl Living for Zombie {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rand::SeedableRng;

    use super::*;
    use crate::app::entities::ChaseTarget;
    use crate::app::events::{EventBus, EventKind, GameEvent};

    struct OpenField;

    impl Passability for OpenField {
        fn is_passable(&self, _x: i32, _y: i32) -> bool {
            true
        }
    }

    struct Walls(Vec<(i32, i32)>);

    impl Passability for Walls {
        fn is_passable(&self, x: i32, y: i32) -> bool {
            !self.0.contains(&(x, y))
        }
    }

    struct Boxed;

    impl Passability for Boxed {
        fn is_passable(&self, _x: i32, _y: i32) -> bool {
            false
        }
    }

    #[test]
    fn chase_strictly_closes_chebyshev_distance() {
        let mut zombie = Zombie::new(ZombieTuning::default());
        let mut pos = Pos::new(0, 0, 0);
        let target = Pos::new(37, -23, 0);
        let mut distance = pos.chebyshev(target);

        while distance > 0 {
            assert!(zombie.chase_step(&mut pos, target, &OpenField));
            let next = pos.chebyshev(target);
            assert!(next < distance, "distance went from {distance} to {next}");
            distance = next;
        }
        assert_eq!(pos, target);
    }

    #[test]
    fn chase_keeps_heading_while_it_still_closes_distance() {
        let mut zombie = Zombie::new(ZombieTuning::default()).with_heading(Direction::Right);
        let mut pos = Pos::new(0, 0, 0);

        zombie.chase_step(&mut pos, Pos::new(20, 40, 0), &OpenField);

        assert_eq!(zombie.heading(), Direction::Right);
        assert_eq!(pos, Pos::new(5, 5, 0));
    }

    #[test]
    fn blocked_combined_step_falls_back_to_heading_axis() {
        let mut zombie = Zombie::new(ZombieTuning::default()).with_heading(Direction::Down);
        let mut pos = Pos::new(0, 0, 0);
        let walls = Walls(vec![(5, 5)]);

        assert!(zombie.chase_step(&mut pos, Pos::new(20, 20, 0), &walls));

        assert_eq!(pos, Pos::new(0, 5, 0));
        assert_eq!(zombie.heading(), Direction::Down);
    }

    #[test]
    fn fully_blocked_chase_reports_stuck() {
        let mut zombie = Zombie::new(ZombieTuning::default());
        let mut pos = Pos::new(0, 0, 0);

        assert!(!zombie.chase_step(&mut pos, Pos::new(20, 20, 0), &Boxed));
        assert_eq!(pos, Pos::new(0, 0, 0));
    }

    #[test]
    fn wander_stays_put_when_boxed_in() {
        let mut zombie = Zombie::new(ZombieTuning::default());
        let mut pos = Pos::new(10, 10, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..20 {
            zombie.wander_step(&mut pos, &Boxed, &mut rng);
        }
        assert_eq!(pos, Pos::new(10, 10, 0));
    }

    #[test]
    fn wander_keeps_heading_on_open_ground() {
        let mut zombie = Zombie::new(ZombieTuning::default()).with_heading(Direction::Up);
        let mut pos = Pos::new(0, 0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

        for step in 1..=200 {
            zombie.wander_step(&mut pos, &OpenField, &mut rng);
            assert_eq!(zombie.heading(), Direction::Up);
            assert_eq!(pos, Pos::new(0, -5 * step, 0));
        }
    }

    #[test]
    fn wander_turns_when_heading_is_blocked() {
        let mut zombie = Zombie::new(ZombieTuning::default()).with_heading(Direction::Up);
        let mut pos = Pos::new(10, 10, 0);
        let walls = Walls(vec![(10, 5)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        zombie.wander_step(&mut pos, &walls, &mut rng);

        assert_ne!(pos, Pos::new(10, 10, 0));
        assert_eq!(pos.chebyshev(Pos::new(10, 10, 0)), 5);
    }

    #[test]
    fn contact_damage_respects_cooldown() {
        let tuning = ZombieTuning {
            move_interval: Duration::from_secs(60),
            ..ZombieTuning::default()
        };
        let mut zombie = Zombie::new(tuning);
        let zombie_id = EntityId::new("zombie_1");
        let player_id = EntityId::new("player");
        let mut pos = Pos::new(0, 0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut bus = EventBus::new();
        let events: Vec<Rc<GameEvent>> = Vec::new();

        for _ in 0..10 {
            let mut ctx = UpdateContext {
                dt: Duration::from_millis(100),
                events: &events,
                world: &OpenField,
                target: Some(ChaseTarget {
                    id: &player_id,
                    pos: Pos::new(5, 0, 0),
                }),
                rng: &mut rng,
                bus: &mut bus,
            };
            zombie.update(&zombie_id, &mut pos, &mut ctx);
        }

        assert_eq!(zombie.mode(), ZombieMode::Chase);
        assert_eq!(bus.count_of(EventKind::EntityDamaged), 1);
    }
}
