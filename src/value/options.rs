/// Why a write happened.
///
/// Carried in [`SetOptions`] and handed to every listener, so downstream code
/// (the [`Hub`](crate::Hub) in particular) can tell a user write from a write
/// it produced itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// Initial call delivered to a listener registered with `auto_call`.
    AutoCall,
    /// State overwrite performed while binding a store to an entity.
    Rebind,
    /// Copy of a write made on a sibling store bound to the same entity.
    Propagated,
    /// Write pushed by the hub from the entity record itself.
    EntitySync,
    /// Caller-defined tag. Never suppresses propagation.
    Custom(&'static str),
}

impl Reason {
    /// Whether a hub listener must not forward a write carrying this reason.
    #[inline]
    pub fn suppresses_propagation(self) -> bool {
        matches!(self, Reason::Rebind | Reason::Propagated | Reason::EntitySync)
    }
}

/// Options attached to a single write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Notify listeners even when the new value equals the current one.
    pub always_notify: bool,
    /// Origin of the write.
    pub reason: Option<Reason>,
    /// Number of hub hops this write has travelled.
    pub hops: u32,
}

impl SetOptions {
    /// Plain write: equality-suppressed, no reason.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write that notifies even when the value is unchanged.
    pub fn forced() -> Self {
        Self {
            always_notify: true,
            ..Self::default()
        }
    }

    /// Write tagged with `reason`.
    pub fn with_reason(reason: Reason) -> Self {
        Self {
            reason: Some(reason),
            ..Self::default()
        }
    }

    /// Set the reason on an existing options value.
    pub fn reason(mut self, reason: Reason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// The options a hub attaches when copying this write to a sibling.
    ///
    /// `always_notify` is not forwarded: siblings run their own equality check.
    pub fn propagated(&self) -> Self {
        Self {
            always_notify: false,
            reason: Some(Reason::Propagated),
            hops: self.hops + 1,
        }
    }

    /// Whether a hub must stop at this write.
    #[inline]
    pub fn suppresses_propagation(&self) -> bool {
        self.reason.is_some_and(Reason::suppresses_propagation)
    }
}

/// Options for registering a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Invoke the listener with the current value before registration returns.
    pub auto_call: bool,
}

impl ListenerOptions {
    /// Listener that waits for the next change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that also receives the current value immediately.
    pub fn auto_call() -> Self {
        Self { auto_call: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_reasons_suppress_propagation() {
        assert!(Reason::Rebind.suppresses_propagation());
        assert!(Reason::Propagated.suppresses_propagation());
        assert!(Reason::EntitySync.suppresses_propagation());
        assert!(!Reason::AutoCall.suppresses_propagation());
        assert!(!Reason::Custom("reducer").suppresses_propagation());
        assert!(!SetOptions::new().suppresses_propagation());
    }

    #[test]
    fn propagated_counts_hops_and_drops_force() {
        let origin = SetOptions::forced().reason(Reason::Custom("ui"));
        let copy = origin.propagated();
        assert_eq!(copy.hops, 1);
        assert_eq!(copy.reason, Some(Reason::Propagated));
        assert!(!copy.always_notify);
        assert_eq!(copy.propagated().hops, 2);
    }
}
