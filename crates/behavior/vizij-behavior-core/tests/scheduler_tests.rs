use vizij_behavior::{
    parse_behavior_catalog_json, Animatable, AnimationCatalog, BehaviorCommand, BehaviorError, BehaviorEvent,
    Config, Inputs, ObjectId, ObjectState, PlayOutcome, ProcedureRegistry, Scheduler, StopType,
};

fn catalog(name: &str) -> AnimationCatalog {
    let json = vizij_test_fixtures::catalogs::json(name).expect("catalog fixture");
    parse_behavior_catalog_json(&json).expect("catalog parses")
}

fn spawn(sched: &mut Scheduler, catalog: &AnimationCatalog) -> ObjectId {
    sched.spawn_object(catalog, Box::new(ObjectState::default()))
}

#[test]
fn commands_apply_before_the_tick() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    let b = spawn(&mut sched, &character);
    assert_ne!(a, b);

    let out = sched.update(
        Inputs::new()
            .play(a, "walk", StopType::Default)
            .play(b, "blink", StopType::Default),
    );
    assert_eq!(out.tick, 1);
    assert_eq!(
        out.for_object(a).collect::<Vec<_>>(),
        vec![&BehaviorEvent::Started {
            animation: "walk".into()
        }]
    );
    assert_eq!(out.for_object(b).count(), 1);
    assert!(sched.is_playing(a, Some("walk"), false));
    assert!(!sched.is_playing(b, Some("walk"), false));
    assert_eq!(sched.target(a).unwrap().position(), [0.25, 0.0, 0.0]);
    assert_eq!(sched.target(b).unwrap().position(), [0.0, 0.0, 0.0]);
}

#[test]
fn failed_commands_become_rejected_events() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    let ghost = ObjectId(99);

    let mut inputs = Inputs::new().play(a, "fly", StopType::Default);
    inputs.commands.push(BehaviorCommand::StopAll {
        object: ghost,
        stop: StopType::Stop,
    });
    let out = sched.update(inputs);

    assert_eq!(out.events.len(), 2);
    assert!(matches!(
        &out.events[0].event,
        BehaviorEvent::Rejected { error: BehaviorError::AnimationNotFound { .. }, .. }
    ));
    assert_eq!(out.events[1].object, ghost);
    assert!(matches!(
        &out.events[1].event,
        BehaviorEvent::Rejected { error: BehaviorError::ObjectNotFound { id: 99 }, .. }
    ));
}

#[test]
fn direct_calls_report_on_the_next_update() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);

    assert_eq!(
        sched.play(a, "idle", StopType::Default).unwrap(),
        PlayOutcome::Queued
    );
    assert!(sched.component(a).unwrap().is_pending("idle"));
    sched.update(Inputs::default());
    assert_eq!(sched.stop_all(a, StopType::Default).unwrap(), 1);

    // idle ends with a break: gone after one more tick
    let out = sched.update(Inputs::default());
    let events: Vec<_> = out.for_object(a).cloned().collect();
    assert_eq!(
        events,
        vec![
            BehaviorEvent::StopRequested {
                animation: "idle".into(),
                stop: StopType::Default
            },
            BehaviorEvent::Ended {
                animation: "idle".into()
            },
        ]
    );
    assert!(!sched.is_playing(a, None, true));
}

#[test]
fn despawn_returns_contexts_and_target() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    sched.play(a, "jump", StopType::Default).unwrap();
    sched.play(a, "blink", StopType::Default).unwrap();
    sched.update(Inputs::default());
    assert_eq!(sched.pool().in_use_count(), 3);

    let target = sched.despawn_object(a).unwrap();
    assert_eq!(target.position(), [0.0, 1.0, 0.0]);
    assert_eq!(sched.pool().in_use_count(), 0);
    assert_eq!(sched.pool().reusable_count(), 3);
    assert_eq!(sched.object_count(), 0);

    assert!(matches!(
        sched.despawn_object(a),
        Err(BehaviorError::ObjectNotFound { .. })
    ));
    assert!(!sched.is_playing(a, None, true));
    assert!(matches!(
        sched.play(a, "walk", StopType::Default),
        Err(BehaviorError::ObjectNotFound { .. })
    ));
}

#[test]
fn event_cap_drops_overflow() {
    let json = vizij_test_fixtures::configs::json("small-pool").expect("config fixture");
    let cfg = Config::from_json(&json).unwrap();
    assert_eq!(cfg.max_events_per_tick, 3);

    let character = catalog("character");
    let mut sched = Scheduler::new(cfg, ProcedureRegistry::with_stock());
    assert_eq!(sched.pool().reusable_count(), 4);

    let mut inputs = Inputs::new();
    for _ in 0..3 {
        let id = spawn(&mut sched, &character);
        inputs = inputs
            .play(id, "walk", StopType::Default)
            .play(id, "blink", StopType::Default);
    }
    let out = sched.update(inputs);
    assert_eq!(out.events.len(), 3);
    assert_eq!(out.dropped_events, 3);

    let out = sched.update(Inputs::default());
    assert_eq!(out.dropped_events, 0);
}

#[test]
fn target_mut_is_seen_by_procedures() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    sched
        .target_mut(a)
        .unwrap()
        .set_position([10.0, 0.0, 0.0]);
    sched.play(a, "walk", StopType::Default).unwrap();
    sched.update(Inputs::default());
    assert_eq!(sched.target(a).unwrap().position(), [10.25, 0.0, 0.0]);
}

#[test]
fn inputs_deserialize_from_json() {
    let json = r#"{ "commands": [
        { "Play": { "object": 0, "animation": "walk" } },
        { "Stop": { "object": 0, "animation": "walk", "stop": "finish" } },
        { "StopAll": { "object": 1 } }
    ] }"#;
    let inputs: Inputs = serde_json::from_str(json).unwrap();
    assert_eq!(
        inputs.commands[0],
        BehaviorCommand::Play {
            object: ObjectId(0),
            animation: "walk".into(),
            stop: StopType::Default
        }
    );
    assert_eq!(inputs.commands[2].object(), ObjectId(1));
}

#[test]
fn custom_procedures_can_be_registered_later() {
    let catalog = parse_behavior_catalog_json(
        r#"{ "animations": [{ "name": "hop", "procedures": ["hop"] }] }"#,
    )
    .unwrap();
    let mut sched = Scheduler::new(Config::default(), ProcedureRegistry::new());
    let a = spawn(&mut sched, &catalog);
    assert!(matches!(
        sched.play(a, "hop", StopType::Default),
        Err(BehaviorError::ProcedureNotFound { .. })
    ));

    sched.registry_mut().register("hop", |_| {
        Ok(vizij_behavior::procedure_fn(|scope| {
            scope.target().increment_position([0.0, 1.0, 0.0]);
            Ok(vizij_behavior::Step::Done)
        }))
    });
    sched.play(a, "hop", StopType::Default).unwrap();
    let out = sched.update(Inputs::default());
    assert_eq!(out.events.len(), 2);
    assert_eq!(sched.target(a).unwrap().position(), [0.0, 1.0, 0.0]);
}

#[test]
fn bare_stop_commands_stop_hard() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    sched.update(Inputs::new().play(a, "walk", StopType::Default));

    // walk ends with `finish` by default; a command without `stop` must not wait for it
    let json = r#"{ "commands": [
        { "Stop": { "object": 0, "animation": "walk" } },
        { "StopAll": { "object": 0 } }
    ] }"#;
    let inputs: Inputs = serde_json::from_str(json).unwrap();
    assert_eq!(
        inputs.commands[0],
        BehaviorCommand::Stop {
            object: ObjectId(0),
            animation: "walk".into(),
            stop: StopType::Stop
        }
    );
    assert_eq!(
        inputs.commands[1],
        BehaviorCommand::StopAll {
            object: ObjectId(0),
            stop: StopType::Stop
        }
    );

    let out = sched.update(inputs);
    assert_eq!(
        out.for_object(a).collect::<Vec<_>>(),
        vec![
            &BehaviorEvent::StopRequested {
                animation: "walk".into(),
                stop: StopType::Stop
            },
            &BehaviorEvent::Ended {
                animation: "walk".into()
            },
        ]
    );
    assert!(!sched.is_playing(a, None, true));
    assert_eq!(sched.pool().in_use_count(), 0);
}

#[test]
fn clear_returns_every_context_and_restarts_ids() {
    let character = catalog("character");
    let mut sched = Scheduler::with_stock();
    let a = spawn(&mut sched, &character);
    let b = spawn(&mut sched, &character);
    sched.update(
        Inputs::new()
            .play(a, "walk", StopType::Default)
            .play(b, "idle", StopType::Default),
    );
    assert_eq!(sched.pool().in_use_count(), 2);

    sched.clear();
    assert_eq!(sched.object_count(), 0);
    assert_eq!(sched.pool().in_use_count(), 0);
    assert_eq!(spawn(&mut sched, &character), ObjectId(0));
}
