//! A bounded pool of exclusively held members.
//!
//! Members are built and retired through a [`MemberFactory`]. At most
//! `max_active` members are checked out at once; further checkouts block
//! until one is returned or the wait limit passes.

use crate::error::{ErrorKind, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::instrument;

/// Lifecycle hooks for the members of a [`Pool`].
pub trait MemberFactory: Send + Sync {
    type Member: Send;

    fn create(&self) -> Result<Self::Member>;

    /// Retire a member for good.
    fn destroy(&self, member: Self::Member) -> Result<()>;

    /// Checked on checkout and on return; a member that is not reusable is
    /// destroyed instead of being handed out or kept idle.
    fn is_reusable(&self, _member: &Self::Member) -> bool {
        true
    }

    /// Called on every return, before the member goes back to the idle set.
    fn passivate(&self, _member: &mut Self::Member) -> Result<()> {
        Ok(())
    }

    /// Retire a member that must not be used again.
    fn invalidate(&self, member: Self::Member) -> Result<()> {
        self.destroy(member)
    }
}

struct State<M> {
    idle: VecDeque<M>,
    active: usize,
    closed: bool,
}

pub struct Pool<F: MemberFactory> {
    factory: F,
    state: Mutex<State<F::Member>>,
    available: Condvar,
    max_active: usize,
    max_wait: Duration,
}

impl<F: MemberFactory> Pool<F> {
    pub fn new(factory: F, max_active: usize, max_wait: Duration) -> Self {
        Self {
            factory,
            state: Mutex::new(State { idle: VecDeque::new(), active: 0, closed: false }),
            available: Condvar::new(),
            max_active: max_active.max(1),
            max_wait,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Take a member for exclusive use, reusing an idle one when possible.
    ///
    /// Blocks for up to the wait limit while `max_active` members are out.
    #[instrument(level = "debug", skip(self))]
    pub fn checkout(&self) -> Result<Checkout<'_, F>> {
        let deadline = Instant::now() + self.max_wait;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                exn::bail!(ErrorKind::Closed);
            }
            if let Some(member) = state.idle.pop_front() {
                state.active += 1;
                if self.factory.is_reusable(&member) {
                    return Ok(Checkout::new(self, member));
                }
                drop(state);
                return match self.factory.destroy(member) {
                    Ok(()) => self.create_reserved(),
                    Err(err) => {
                        self.release_slot();
                        Err(err)
                    },
                };
            }
            if state.active < self.max_active {
                state.active += 1;
                drop(state);
                return self.create_reserved();
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                tracing::warn!(
                    active = state.active,
                    max_active = self.max_active,
                    waited_ms = self.max_wait.as_millis() as u64,
                    "Pool exhausted"
                );
                exn::bail!(ErrorKind::Exhausted);
            }
        }
    }

    /// Build a member for a slot already counted as active.
    fn create_reserved(&self) -> Result<Checkout<'_, F>> {
        match self.factory.create() {
            Ok(member) => Ok(Checkout::new(self, member)),
            Err(err) => {
                self.release_slot();
                Err(err)
            },
        }
    }

    fn release_slot(&self) {
        self.state.lock().active -= 1;
        self.available.notify_one();
    }

    /// Put a member back, or retire it when it is no longer reusable.
    fn restore(&self, mut member: F::Member) -> Result<()> {
        let passivated = self.factory.passivate(&mut member);
        let mut state = self.state.lock();
        state.active -= 1;
        if passivated.is_ok() && !state.closed && self.factory.is_reusable(&member) {
            state.idle.push_back(member);
            drop(state);
            self.available.notify_one();
            return Ok(());
        }
        drop(state);
        self.available.notify_one();
        let destroyed = self.factory.destroy(member);
        passivated.and(destroyed)
    }

    fn discard(&self, member: F::Member) -> Result<()> {
        self.release_slot();
        self.factory.invalidate(member)
    }

    /// Stop handing out members and retire every idle one. Members still
    /// checked out are retired when they come back.
    pub fn close(&self) -> Result<()> {
        let idle = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.idle)
        };
        self.available.notify_all();
        let mut outcome = Ok(());
        for member in idle {
            if let Err(err) = self.factory.destroy(member) {
                tracing::error!(error = %err, "Failed to retire idle pool member");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn num_active(&self) -> usize {
        self.state.lock().active
    }

    pub fn num_idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Summary for logs: `active 1 of max 2, idle 1`.
    pub fn state(&self) -> String {
        let state = self.state.lock();
        format!("active {} of max {}, idle {}", state.active, self.max_active, state.idle.len())
    }
}

impl<F: MemberFactory> Drop for Pool<F> {
    fn drop(&mut self) {
        if !self.is_closed()
            && let Err(err) = self.close()
        {
            tracing::warn!(error = %err, "Failed to close pool on drop");
        }
    }
}

/// Exclusive use of one pool member. Returned to the pool when dropped.
pub struct Checkout<'p, F: MemberFactory> {
    pool: &'p Pool<F>,
    member: Option<F::Member>,
}

impl<'p, F: MemberFactory> Checkout<'p, F> {
    fn new(pool: &'p Pool<F>, member: F::Member) -> Self {
        Self { pool, member: Some(member) }
    }

    /// Return the member, reporting a failure to retire it.
    pub fn checkin(mut self) -> Result<()> {
        match self.member.take() {
            Some(member) => self.pool.restore(member),
            None => Ok(()),
        }
    }

    /// Retire the member instead of returning it.
    pub fn invalidate(mut self) -> Result<()> {
        match self.member.take() {
            Some(member) => self.pool.discard(member),
            None => Ok(()),
        }
    }
}

impl<F: MemberFactory> Deref for Checkout<'_, F> {
    type Target = F::Member;

    fn deref(&self) -> &Self::Target {
        match &self.member {
            Some(member) => member,
            None => unreachable!("member is only taken by consuming the checkout"),
        }
    }
}

impl<F: MemberFactory> DerefMut for Checkout<'_, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.member {
            Some(member) => member,
            None => unreachable!("member is only taken by consuming the checkout"),
        }
    }
}

impl<F: MemberFactory> Drop for Checkout<'_, F> {
    fn drop(&mut self) {
        if let Some(member) = self.member.take()
            && let Err(err) = self.pool.restore(member)
        {
            tracing::warn!(error = %err, "Failed to return pool member");
        }
    }
}
