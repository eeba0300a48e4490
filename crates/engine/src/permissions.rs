//! Permission reconciliation.
//!
//! Decides whether the caller's remotely held permission groups cover a
//! locally required set of `(activity, level)` pairs:
//!
//! 1. reject an empty requirement set before any network call;
//! 2. fetch the held group ids (`egna`);
//! 3. fetch every group definition concurrently, bounded by a semaphore;
//! 4. merge definitions, keeping the highest level per activity;
//! 5. compare against the requirements and collect every gap.
//!
//! Fetch failures abort the check and are returned as the transport
//! reported them. Gaps are collected into one
//! [`LadokError::MissingPermissions`].

use ladok_core::error::{LadokError, LadokResult, MissingPermission, PermissionErrors};
use ladok_core::levels::{self, level_satisfies};
use ladok_core::{ActivityGrant, ActivityId, GrantEntry, GroupId, PermissionGrants, Permissions};
use ladok_provider::LadokProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default max concurrent `behorighetsprofil` fetches.
/// Callers rarely hold more than a handful of groups.
const DEFAULT_CONCURRENCY: usize = 4;

/// Tuning for [`PermissionReconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Max concurrent `behorighetsprofil` fetches.
    pub max_concurrent: usize,
    /// Bound on the whole check; expiry behaves like cancellation.
    pub timeout: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

/// Checks required permissions against the caller's held groups.
///
/// ```ignore
/// let reconciler = PermissionReconciler::new(Arc::new(provider))
///     .with_timeout(Duration::from_secs(10));
/// reconciler.check_permission(&required).await?;
/// ```
pub struct PermissionReconciler {
    provider: Arc<dyn LadokProvider>,
    config: ReconcilerConfig,
}

impl PermissionReconciler {
    pub fn new(provider: Arc<dyn LadokProvider>) -> Self {
        Self {
            provider,
            config: ReconcilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self.config.max_concurrent = config.max_concurrent.max(1);
        self
    }

    /// Override max concurrent definition fetches (default: 4, minimum 1).
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrent = n.max(1);
        self
    }

    /// Bound the whole check; expiry behaves like cancellation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub async fn check_permission(&self, required: &Permissions) -> LadokResult<()> {
        self.check_permission_with_cancel(required, &CancellationToken::new())
            .await
    }

    /// Like [`check_permission`](Self::check_permission), abandoning all
    /// outstanding fetches once `cancel` fires.
    pub async fn check_permission_with_cancel(
        &self,
        required: &Permissions,
        cancel: &CancellationToken,
    ) -> LadokResult<()> {
        if required.is_empty() {
            return Err(LadokError::NoPermissionsProvided);
        }

        let result = match self.fetch_held_grants_with_cancel(cancel).await {
            Ok(held) => evaluate(&unify(&held.granted, required), required),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => tracing::info!(required = required.len(), "permission check passed"),
            Err(LadokError::MissingPermissions(missing)) => {
                tracing::info!(missing = missing.len(), "permission check found gaps")
            }
            Err(e) => tracing::warn!(error = %e, "permission check failed"),
        }
        result
    }

    /// Fetches and merges every held group without judging it.
    pub async fn fetch_held_grants(&self) -> LadokResult<HeldGrants> {
        self.fetch_held_grants_with_cancel(&CancellationToken::new())
            .await
    }

    pub async fn fetch_held_grants_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> LadokResult<HeldGrants> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.collect(cancel))
                .await
                .map_err(|_| LadokError::TimedOut(limit))?,
            None => self.collect(cancel).await,
        }
    }

    async fn collect(&self, cancel: &CancellationToken) -> LadokResult<HeldGrants> {
        let groups = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LadokError::Cancelled),
            groups = self.provider.fetch_held_permission_groups() => groups?,
        };

        let group_count = groups.len();
        let definitions = self.fetch_definitions(groups, cancel).await?;
        Ok(HeldGrants {
            groups: group_count,
            granted: merge_definitions(&definitions),
        })
    }

    /// Fetches all group definitions. Fail-fast: once one fetch fails, the
    /// rest are stopped and that failure is returned.
    async fn fetch_definitions(
        &self,
        groups: Vec<GroupId>,
        cancel: &CancellationToken,
    ) -> LadokResult<Vec<Vec<ActivityGrant>>> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            groups = groups.len(),
            concurrency = self.config.max_concurrent,
            "fetching permission profiles"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        // Fires on caller cancellation or on the first failed fetch.
        let stop = cancel.child_token();
        let mut tasks = JoinSet::new();

        for group in groups {
            let provider = Arc::clone(&self.provider);
            let sem = Arc::clone(&semaphore);
            let stop = stop.clone();
            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = stop.cancelled() => return Err(LadokError::Cancelled),
                    permit = sem.acquire_owned() => permit
                        .map_err(|e| LadokError::Internal(format!("semaphore closed: {e}")))?,
                };

                let fetched = tokio::select! {
                    biased;
                    _ = stop.cancelled() => return Err(LadokError::Cancelled),
                    fetched = provider.fetch_permission_group_definition(&group) => fetched,
                };

                fetched.map_err(|e| {
                    tracing::warn!(%group, error = %e, "permission profile fetch failed");
                    // Cancel before the permit drops so queued fetches never start.
                    stop.cancel();
                    LadokError::Transport(e)
                })
            });
        }

        // Drain. Results are merged only after every task has joined.
        let mut definitions = Vec::with_capacity(tasks.len());
        let mut failure: Option<LadokError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(definition)) => definitions.push(definition),
                Ok(Err(LadokError::Cancelled)) => {}
                Ok(Err(e)) => {
                    stop.cancel();
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    stop.cancel();
                    failure.get_or_insert(LadokError::Internal(format!(
                        "permission fetch task panicked: {e}"
                    )));
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(LadokError::Cancelled);
        }
        if let Some(e) = failure {
            return Err(e);
        }

        tracing::debug!(fetched = definitions.len(), "permission profiles fetched");
        Ok(definitions)
    }
}

/// Highest granted rank per activity across all held groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldGrants {
    /// Number of held groups the ranks were merged from.
    pub groups: usize,
    pub granted: BTreeMap<ActivityId, i64>,
}

// ---------------------------------------------------------------------------
// Pure reconciliation
// ---------------------------------------------------------------------------

/// Reconciles fetched definitions against the requirements. No I/O.
pub fn reconcile<D>(definitions: &[D], required: &Permissions) -> LadokResult<()>
where
    D: AsRef<[ActivityGrant]>,
{
    if required.is_empty() {
        return Err(LadokError::NoPermissionsProvided);
    }

    let granted = merge_definitions(definitions);
    let grants = unify(&granted, required);
    evaluate(&grants, required)
}

/// Merges group definitions into activity -> highest granted rank.
///
/// Most-permissive-wins: `max` is commutative and associative, so the
/// result does not depend on definition order.
pub fn merge_definitions<D>(definitions: &[D]) -> BTreeMap<ActivityId, i64>
where
    D: AsRef<[ActivityGrant]>,
{
    let mut granted = BTreeMap::new();
    for grant in definitions.iter().flat_map(|d| d.as_ref()) {
        let rank = levels::ordinal(&grant.level);
        granted
            .entry(grant.activity_id)
            .and_modify(|held: &mut i64| *held = (*held).max(rank))
            .or_insert(rank);
    }
    granted
}

/// Builds the two-sided mapping from granted ranks and required names.
pub fn unify(granted: &BTreeMap<ActivityId, i64>, required: &Permissions) -> PermissionGrants {
    let mut grants: PermissionGrants = granted
        .iter()
        .map(|(&id, &rank)| {
            (
                id,
                GrantEntry {
                    granted: Some(rank),
                    required: None,
                },
            )
        })
        .collect();

    for (&id, level) in required {
        grants.entry(id).or_default().required = Some(levels::ordinal(level));
    }
    grants
}

/// Produces the verdict for a unified mapping.
///
/// An empty granted side is reported as [`LadokError::NoPermissionFoundInLadok`]
/// rather than as one gap per requirement.
pub fn evaluate(grants: &PermissionGrants, required: &Permissions) -> LadokResult<()> {
    if !grants.values().any(|g| g.granted.is_some()) {
        return Err(LadokError::NoPermissionFoundInLadok);
    }

    let missing: Vec<MissingPermission> = required
        .iter()
        .filter(|(id, _)| !is_satisfied(grants.get(id).copied().unwrap_or_default()))
        .map(|(&activity_id, level)| MissingPermission {
            activity_id,
            level: level.clone(),
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LadokError::MissingPermissions(PermissionErrors(missing)))
    }
}

/// An undefined required level can never be met.
fn is_satisfied(entry: GrantEntry) -> bool {
    match (entry.granted, entry.required) {
        (Some(held), Some(required)) => {
            levels::is_defined(required) && level_satisfies(held, required)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladok_core::levels::{LEVEL_ADMIN, LEVEL_LOCAL_ADMIN, LEVEL_READ};

    fn required(pairs: &[(ActivityId, &str)]) -> Permissions {
        pairs.iter().map(|&(id, l)| (id, l.to_string())).collect()
    }

    fn definition(pairs: &[(ActivityId, &str)]) -> Vec<ActivityGrant> {
        pairs
            .iter()
            .map(|&(id, l)| ActivityGrant::new(id, l))
            .collect()
    }

    #[test]
    fn unify_same_permission() {
        let granted = merge_definitions(&[definition(&[(51001, LEVEL_READ)])]);
        let grants = unify(&granted, &required(&[(51001, LEVEL_READ)]));
        assert_eq!(
            grants,
            BTreeMap::from([(
                51001,
                GrantEntry {
                    granted: Some(4),
                    required: Some(4)
                }
            )])
        );
    }

    #[test]
    fn unify_disjoint_permissions() {
        let granted = merge_definitions(&[definition(&[(41001, LEVEL_LOCAL_ADMIN)])]);
        let grants = unify(&granted, &required(&[(61001, LEVEL_READ)]));
        assert_eq!(
            grants,
            BTreeMap::from([
                (
                    41001,
                    GrantEntry {
                        granted: Some(6),
                        required: None
                    }
                ),
                (
                    61001,
                    GrantEntry {
                        granted: None,
                        required: Some(4)
                    }
                ),
            ])
        );
    }

    #[test]
    fn unify_different_levels_same_activity() {
        let granted = merge_definitions(&[definition(&[(81001, LEVEL_READ)])]);
        let grants = unify(&granted, &required(&[(81001, LEVEL_LOCAL_ADMIN)]));
        assert_eq!(
            grants[&81001],
            GrantEntry {
                granted: Some(4),
                required: Some(6)
            }
        );
    }

    #[test]
    fn merge_is_order_independent() {
        let read = definition(&[(61001, LEVEL_READ)]);
        let admin = definition(&[(61001, LEVEL_ADMIN)]);

        let forward = merge_definitions(&[read.clone(), admin.clone()]);
        let reverse = merge_definitions(&[admin, read]);

        assert_eq!(forward, reverse);
        assert_eq!(forward[&61001], levels::ordinal(LEVEL_ADMIN));
    }

    #[test]
    fn merge_over_all_permutations_agrees() {
        let defs = [
            definition(&[(1, LEVEL_READ), (2, LEVEL_ADMIN)]),
            definition(&[(1, LEVEL_LOCAL_ADMIN), (3, LEVEL_READ)]),
            definition(&[(2, LEVEL_READ), (3, "rattighetsniva.okand")]),
        ];
        let expected = merge_definitions(&defs);
        let orders = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted: Vec<&Vec<ActivityGrant>> = order.iter().map(|&i| &defs[i]).collect();
            let permuted: Vec<Vec<ActivityGrant>> = permuted.into_iter().cloned().collect();
            assert_eq!(merge_definitions(&permuted), expected, "order {order:?}");
        }
        assert_eq!(expected[&1], 6);
        assert_eq!(expected[&2], 7);
        assert_eq!(expected[&3], 4);
    }

    #[test]
    fn satisfied_requirements_pass() {
        let defs = [definition(&[(61001, LEVEL_READ), (90019, LEVEL_ADMIN)])];
        assert!(reconcile(&defs, &required(&[(61001, LEVEL_READ), (90019, LEVEL_READ)])).is_ok());
    }

    #[test]
    fn uncovered_activity_is_reported() {
        let defs = [definition(&[(61001, LEVEL_READ), (90019, LEVEL_READ)])];
        let err = reconcile(&defs, &required(&[(61001, LEVEL_READ), (8888, LEVEL_READ)]))
            .unwrap_err();
        let LadokError::MissingPermissions(missing) = err else {
            panic!("expected missing permissions, got {err:?}");
        };
        assert_eq!(
            missing,
            PermissionErrors(vec![MissingPermission {
                activity_id: 8888,
                level: LEVEL_READ.into(),
            }])
        );
    }

    #[test]
    fn insufficient_level_is_reported_in_ascending_order() {
        let defs = [definition(&[(300, LEVEL_READ), (100, LEVEL_READ), (200, LEVEL_ADMIN)])];
        let err = reconcile(
            &defs,
            &required(&[(300, LEVEL_LOCAL_ADMIN), (200, LEVEL_READ), (100, LEVEL_ADMIN)]),
        )
        .unwrap_err();
        let LadokError::MissingPermissions(missing) = err else {
            panic!("expected missing permissions, got {err:?}");
        };
        let ids: Vec<ActivityId> = missing.iter().map(|m| m.activity_id).collect();
        assert_eq!(ids, [100, 300]);
        assert_eq!(missing.0[0].level, LEVEL_ADMIN);
    }

    #[test]
    fn extra_grants_are_not_errors() {
        let defs = [definition(&[(1, LEVEL_READ), (2, LEVEL_READ), (3, LEVEL_READ)])];
        assert!(reconcile(&defs, &required(&[(2, LEVEL_READ)])).is_ok());
    }

    #[test]
    fn no_grants_at_all_is_aggregate_error() {
        let defs: [Vec<ActivityGrant>; 2] = [vec![], vec![]];
        let err = reconcile(&defs, &required(&[(61001, LEVEL_READ)])).unwrap_err();
        assert!(matches!(err, LadokError::NoPermissionFoundInLadok));

        let none: [Vec<ActivityGrant>; 0] = [];
        let err = reconcile(&none, &required(&[(61001, LEVEL_READ)])).unwrap_err();
        assert!(matches!(err, LadokError::NoPermissionFoundInLadok));
    }

    #[test]
    fn unknown_required_level_is_never_met() {
        let defs = [definition(&[(61001, LEVEL_ADMIN)])];
        let err = reconcile(&defs, &required(&[(61001, "rattighetsniva.okand")])).unwrap_err();
        assert!(matches!(err, LadokError::MissingPermissions(ref m) if m.len() == 1));
    }

    #[test]
    fn unknown_granted_level_does_not_satisfy() {
        let defs = [definition(&[(61001, "rattighetsniva.okand")])];
        let err = reconcile(&defs, &required(&[(61001, LEVEL_READ)])).unwrap_err();
        assert!(matches!(err, LadokError::MissingPermissions(_)));
    }

    #[test]
    fn empty_requirements_rejected() {
        let defs = [definition(&[(61001, LEVEL_READ)])];
        assert!(matches!(
            reconcile(&defs, &Permissions::new()),
            Err(LadokError::NoPermissionsProvided)
        ));
    }
}
