use tactics_engine::world::creature_spec;
use tactics_engine::{
    Alignment, Command, CommandOutcome, CommandRejection, Controller, Coord, Creature, DamageType,
    Damageable, Direction, EntityId, EntitySpec, SimConfig, SimEventKind, StatusKind, Weapon,
    WeaponKind, WireOrientation, World,
};

fn world(width: u32, height: u32) -> World {
    World::new(width, height, SimConfig::default()).expect("world")
}

fn spawn_player(world: &mut World, at: Coord, alignment: Alignment, weapon: Weapon) -> EntityId {
    let creature = Creature::new("soldier", alignment, weapon)
        .with_controller(Controller::External)
        .with_facing(Direction::E);
    world
        .spawn(creature_spec(creature, Damageable::new(20), false), at)
        .expect("creature")
}

fn health(world: &World, id: EntityId) -> Option<i32> {
    world
        .entity(id)
        .and_then(|entity| entity.damageable.as_ref())
        .map(|damageable| damageable.health)
}

fn tick_until_ready(world: &mut World, id: EntityId) {
    for _ in 0..10 {
        if world.creature(id).is_some_and(|creature| creature.can_act()) {
            return;
        }
        world.tick();
    }
    panic!("creature never became ready");
}

fn carbine() -> Weapon {
    Weapon::new("carbine", WeaponKind::Gun, 10)
        .with_range(8.0)
        .with_clip(2)
}

#[test]
fn firefight_drains_the_clip_kills_once_and_reloads() {
    let mut world = world(8, 3);
    let shooter = spawn_player(&mut world, Coord::new(1, 1), Alignment::WithPlayer, carbine());
    let target = spawn_player(
        &mut world,
        Coord::new(5, 1),
        Alignment::AgainstPlayer,
        Weapon::fists(),
    );

    let aim = Command::Attack {
        aim: Coord::new(5, 1),
    };
    assert_eq!(world.execute(shooter, aim), CommandOutcome::Executed);
    assert_eq!(health(&world, target), Some(10));
    assert_eq!(
        world.execute(shooter, aim),
        CommandOutcome::Rejected(CommandRejection::NotReady)
    );

    tick_until_ready(&mut world, shooter);
    assert!(world.execute(shooter, aim).is_executed());
    assert_eq!(health(&world, target), Some(0));
    assert!(!world.is_active(target));
    let deaths = world
        .drain_events()
        .into_iter()
        .filter(|event| event.kind() == SimEventKind::Died)
        .count();
    assert_eq!(deaths, 1);
    assert_eq!(world.damage_entity(target, 50, DamageType::Physical), 0);

    tick_until_ready(&mut world, shooter);
    assert!(world.entity(target).is_none());
    assert_eq!(
        world.execute(shooter, aim),
        CommandOutcome::Rejected(CommandRejection::NoAmmo)
    );
    assert!(world.execute(shooter, Command::Reload).is_executed());
    assert_eq!(world.creature(shooter).map(|creature| creature.weapon.ammo), Some(2));
}

#[test]
fn round_stops_once_the_penetration_budget_goes_negative() {
    let mut world = world(8, 3);
    let rifle = carbine().with_penetration(2);
    let shooter = spawn_player(&mut world, Coord::new(1, 1), Alignment::WithPlayer, rifle);
    let crate_id = world
        .spawn(EntitySpec::crate_prop(), Coord::new(2, 1))
        .expect("crate");
    let first = spawn_player(
        &mut world,
        Coord::new(3, 1),
        Alignment::AgainstPlayer,
        Weapon::fists(),
    );
    let second = spawn_player(
        &mut world,
        Coord::new(4, 1),
        Alignment::AgainstPlayer,
        Weapon::fists(),
    );

    assert!(world
        .execute(
            shooter,
            Command::Attack {
                aim: Coord::new(6, 1)
            }
        )
        .is_executed());
    // crate costs 2 of the budget, the first soldier overdraws it
    assert_eq!(health(&world, crate_id), Some(20));
    assert_eq!(health(&world, first), Some(10));
    assert_eq!(health(&world, second), Some(20));
}

#[test]
fn trip_wire_beside_a_wall_only_extends_the_open_way() {
    let mut world = world(7, 3);
    world.spawn(EntitySpec::wall(), Coord::new(4, 1)).expect("wall");
    let span = world
        .deploy_trip_wire(
            Coord::new(3, 1),
            WireOrientation::Horizontal,
            2,
            Some(Alignment::WithPlayer),
            5,
            2,
        )
        .expect("wire");
    assert!(span.sides[0].is_empty());
    assert_eq!(span.sides[1], vec![Coord::new(2, 1), Coord::new(1, 1)]);
    assert_eq!(span.tile_count(), 3);

    let ally = spawn_player(&mut world, Coord::new(2, 0), Alignment::WithPlayer, Weapon::fists());
    let enemy = spawn_player(
        &mut world,
        Coord::new(1, 0),
        Alignment::AgainstPlayer,
        Weapon::fists(),
    );

    let south = Command::Move {
        direction: Direction::S,
    };
    assert!(world.execute(ally, south).is_executed());
    assert_eq!(health(&world, ally), Some(20));
    assert!(world.is_active(span.wire));

    assert!(world.execute(enemy, south).is_executed());
    assert_eq!(health(&world, enemy), Some(15));
    assert!(world
        .creature(enemy)
        .is_some_and(|creature| creature.statuses.has(StatusKind::Stunned)));
    assert!(!world.is_active(span.wire));
    assert!(world
        .entities_at(Coord::new(1, 1))
        .iter()
        .all(|id| *id == enemy || !world.is_active(*id)));

    world.tick();
    world.tick();
    assert!(!world.creature(enemy).is_some_and(|creature| creature.can_act()));
    world.tick();
    assert!(world.creature(enemy).is_some_and(|creature| creature.can_act()));
}

#[test]
fn closing_a_door_blocks_sight_and_a_second_close_is_refused() {
    let mut world = world(5, 1);
    world.spawn(EntitySpec::door(true), Coord::new(2, 0)).expect("door");
    let keeper = spawn_player(&mut world, Coord::new(1, 0), Alignment::WithPlayer, Weapon::fists());
    assert!(world.has_line_of_sight(Coord::new(0, 0), Coord::new(4, 0)));

    let close = Command::CloseDoor {
        at: Coord::new(2, 0),
    };
    assert!(world.execute(keeper, close).is_executed());
    assert!(!world.has_line_of_sight(Coord::new(0, 0), Coord::new(4, 0)));
    assert!(!world.can_occupy(Coord::new(2, 0)));

    tick_until_ready(&mut world, keeper);
    assert_eq!(
        world.execute(keeper, close),
        CommandOutcome::Rejected(CommandRejection::DoorUnchanged)
    );
}
