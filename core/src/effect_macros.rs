//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when building timers and fire-and-forget
//! work inside reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use critter_core::async_effect;
///
/// async_effect! {
///     storage.save("pet", payload).await.ok();
///     None
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use critter_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_millis(1500),
///     action: PetAction::ReactionExpired { seq: 3 }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` wrapping a delayed action
///
/// Registering under an id that is already pending replaces the pending
/// task, so this is the building block for restartable timers.
///
/// # Example
///
/// ```rust,ignore
/// use critter_core::{cancellable_delay, effect::EffectId};
///
/// const TICK: EffectId = EffectId::new("tick");
///
/// cancellable_delay! {
///     id: TICK,
///     duration: Duration::from_secs(2),
///     action: PetAction::Tick { epoch: 1 }
/// }
/// ```
#[macro_export]
macro_rules! cancellable_delay {
    (
        id: $id:expr,
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                action: $action
            }),
        }
    };
}
