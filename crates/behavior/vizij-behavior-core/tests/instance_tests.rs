use std::sync::Arc;

use serde_json::json;
use vizij_behavior::{
    procedure_fn, AnimationDefinition, AnimationInstance, BehaviorError, ContextPool, EndType,
    ObjectState, ProcedureFault, ProcedureRef, ProcedureRegistry, Step, StopType,
};

fn registry() -> ProcedureRegistry {
    let mut reg = ProcedureRegistry::with_stock();
    reg.register("spin", |_| Ok(procedure_fn(|_| Ok(Step::Yield))));
    reg.register("explode", |_| {
        Ok(procedure_fn(|_| Err(ProcedureFault::new("boom"))))
    });
    // Launches a one-tick wait, then returns.
    reg.register("spawner", |_| {
        Ok(procedure_fn(|scope| {
            scope.spawn("wait");
            Ok(Step::Done)
        }))
    });
    // Declares itself finished but keeps yielding.
    reg.register("quitter", |_| {
        Ok(procedure_fn(|scope| {
            scope.finish();
            Ok(Step::Yield)
        }))
    });
    reg
}

fn walker(end: EndType) -> AnimationInstance {
    let def = AnimationDefinition::new("walk", 0)
        .with_procedure_ref(ProcedureRef::with_params(
            "move_by",
            json!({ "delta": [4.0, 0.0, 0.0], "ticks": 4 }),
        ))
        .with_loop_count(-1)
        .with_default_end(end);
    AnimationInstance::new(Arc::new(def))
}

#[test]
fn play_binds_one_context_per_procedure() {
    let mut pool = ContextPool::new(registry());
    let def = AnimationDefinition::new("busy", 0)
        .with_procedure("spin")
        .with_procedure("wait");
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();
    assert!(instance.is_playing());
    assert_eq!(instance.context_count(), 2);
    assert_eq!(instance.end_type(), StopType::Null);

    let err = instance.play(&mut pool).unwrap_err();
    assert!(matches!(err, BehaviorError::AlreadyPlaying { .. }));
}

#[test]
fn stop_on_idle_instance_fails() {
    let mut pool = ContextPool::new(registry());
    let mut instance = walker(EndType::Stop);
    let err = instance.stop(StopType::Stop, &mut pool).unwrap_err();
    assert_eq!(err, BehaviorError::NotPlaying { name: "walk".into() });
}

#[test]
fn failed_play_rolls_back_acquired_contexts() {
    let mut pool = ContextPool::new(registry());
    let def = AnimationDefinition::new("broken", 0)
        .with_procedure("spin")
        .with_procedure("missing");
    let mut instance = AnimationInstance::new(Arc::new(def));
    let err = instance.play(&mut pool).unwrap_err();
    assert!(matches!(err, BehaviorError::ProcedureNotFound { .. }));
    assert!(!instance.is_playing());
    assert_eq!(pool.in_use_count(), 0);
    assert_eq!(pool.reusable_count(), 1);
}

#[test]
fn stop_is_synchronous() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let mut instance = walker(EndType::Break);
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();

    instance.stop(StopType::Stop, &mut pool).unwrap();
    assert!(!instance.is_playing());
    assert_eq!(instance.context_count(), 0);
    assert_eq!(pool.in_use_count(), 0);
}

#[test]
fn default_stop_uses_definition_end_type() {
    let mut pool = ContextPool::new(registry());
    let mut instance = walker(EndType::Finish);
    instance.play(&mut pool).unwrap();
    instance.stop(StopType::Default, &mut pool).unwrap();
    assert!(instance.is_playing());
    assert_eq!(instance.end_type(), StopType::Finish);

    let mut hard = walker(EndType::Stop);
    hard.play(&mut pool).unwrap();
    hard.stop(StopType::Default, &mut pool).unwrap();
    assert!(!hard.is_playing());
}

#[test]
fn break_is_cooperative() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let mut instance = walker(EndType::Stop);
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();

    instance.stop(StopType::Break, &mut pool).unwrap();
    assert!(instance.is_playing());
    assert_eq!(instance.end_type(), StopType::Break);
    assert_eq!(pool.in_use_count(), 1);

    instance.advance(&mut pool, &mut obj, 2).unwrap();
    assert!(!instance.is_playing());
    assert_eq!(obj.position, [1.0, 0.0, 0.0]);
    assert_eq!(pool.in_use_count(), 0);
}

#[test]
fn finish_completes_the_pass() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let mut instance = walker(EndType::Finish);
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();
    instance.stop(StopType::Default, &mut pool).unwrap();

    let mut tick = 1;
    while instance.is_playing() {
        tick += 1;
        instance.advance(&mut pool, &mut obj, tick).unwrap();
    }
    assert_eq!(tick, 4);
    assert_eq!(obj.position, [4.0, 0.0, 0.0]);
}

#[test]
fn reset_restores_the_target() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let mut instance = walker(EndType::Reset);
    instance.play(&mut pool).unwrap();
    for tick in 1..=6 {
        instance.advance(&mut pool, &mut obj, tick).unwrap();
    }
    assert_eq!(obj.position, [6.0, 0.0, 0.0]);

    instance.stop(StopType::Null, &mut pool).unwrap();
    assert_eq!(instance.end_type(), StopType::Reset);
    instance.advance(&mut pool, &mut obj, 7).unwrap();
    assert!(!instance.is_playing());
    assert_eq!(obj.position, [0.0, 0.0, 0.0]);
}

#[test]
fn pause_freezes_and_null_resumes() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let mut instance = walker(EndType::Stop);
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();

    instance.stop(StopType::Pause, &mut pool).unwrap();
    assert!(instance.is_paused());
    let handle = instance.contexts()[0].handle;
    let steps = pool.steps(handle);
    instance.advance(&mut pool, &mut obj, 2).unwrap();
    assert_eq!(pool.steps(handle), steps);
    assert_eq!(obj.position, [1.0, 0.0, 0.0]);

    instance.stop(StopType::Null, &mut pool).unwrap();
    assert!(!instance.is_paused());
    assert!(instance.is_playing());
    instance.advance(&mut pool, &mut obj, 3).unwrap();
    assert_eq!(obj.position, [2.0, 0.0, 0.0]);

    // play() on a paused instance also resumes it
    instance.stop(StopType::Pause, &mut pool).unwrap();
    instance.play(&mut pool).unwrap();
    assert!(!instance.is_paused());
}

#[test]
fn single_pass_ends_on_its_own() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let def = AnimationDefinition::new("nod", 0).with_procedure_ref(ProcedureRef::with_params(
        "rotate_by",
        json!({ "delta": [0.0, 2.0, 0.0], "ticks": 2 }),
    ));
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();
    assert!(instance.is_playing());
    instance.advance(&mut pool, &mut obj, 2).unwrap();
    assert!(!instance.is_playing());
    assert_eq!(obj.rotation, [0.0, 2.0, 0.0]);
    assert_eq!(pool.stats().released, 1);
}

#[test]
fn spawned_procedures_run_from_the_next_tick() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let def = AnimationDefinition::new("chain", 0).with_procedure("spawner");
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();

    instance.advance(&mut pool, &mut obj, 1).unwrap();
    assert!(instance.is_playing());
    assert_eq!(instance.context_count(), 1);
    assert_eq!(instance.contexts()[0].procedure, "wait");
    assert_eq!(pool.steps(instance.contexts()[0].handle), Some(0));

    instance.advance(&mut pool, &mut obj, 2).unwrap();
    assert!(!instance.is_playing());
    assert_eq!(pool.in_use_count(), 0);
}

#[test]
fn finish_call_then_yield_returns_the_context() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let def = AnimationDefinition::new("quit", 0)
        .with_procedure("quitter")
        .with_procedure("spin");
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();
    instance.advance(&mut pool, &mut obj, 1).unwrap();
    assert_eq!(instance.context_count(), 1);
    assert_eq!(instance.contexts()[0].procedure, "spin");
}

#[test]
fn finish_by_procedure_id() {
    let mut pool = ContextPool::new(registry());
    let def = AnimationDefinition::new("mixed", 0)
        .with_procedure("spin")
        .with_procedure("spin")
        .with_procedure("wait");
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();

    assert_eq!(instance.finish("spin", &mut pool), 2);
    assert!(instance.is_playing());
    assert_eq!(instance.finish("wait", &mut pool), 1);
    assert!(!instance.is_playing());
    assert_eq!(pool.in_use_count(), 0);
}

#[test]
fn fault_recycles_the_instance() {
    let mut pool = ContextPool::new(registry());
    let mut obj = ObjectState::default();
    let def = AnimationDefinition::new("boom", 0)
        .with_procedure("spin")
        .with_procedure("explode");
    let mut instance = AnimationInstance::new(Arc::new(def));
    instance.play(&mut pool).unwrap();

    let err = instance.advance(&mut pool, &mut obj, 1).unwrap_err();
    assert!(matches!(err, BehaviorError::ExecutionFault { .. }));
    assert!(!instance.is_playing());
    assert_eq!(pool.in_use_count(), 0);
    assert_eq!(pool.stats().faults, 1);
}
