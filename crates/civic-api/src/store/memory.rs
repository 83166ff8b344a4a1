//! In-memory [`IssueStore`].
//!
//! All tables live behind one `parking_lot::Mutex`, held for the whole of
//! each trait method and never across an `.await`. A method therefore
//! observes and leaves a consistent snapshot, so a cached counter cannot
//! drift from its rows.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use civic_core::{haversine_km, FlagId, GeoPoint, ProblemId, RatingValue, UserId};
use civic_state::{
    ensure_bannable, ensure_deletable, ProblemStatus, StatusTransition, TransitionPolicy,
};

use super::{
    AnalyticsSnapshot, FlagRecord, FlaggedIssueView, FlaggedProblem, IssueStore, NearbyProblem,
    NewProblem, NewUser, ProblemRecord, ProblemStats, StoreError, UserRecord, UserStats,
    VoteOutcome,
};

#[derive(Debug, Default)]
struct Tables {
    last_user_id: i64,
    last_problem_id: i64,
    last_flag_id: i64,
    users: BTreeMap<UserId, UserRecord>,
    problems: BTreeMap<ProblemId, ProblemRecord>,
    votes: BTreeSet<(ProblemId, UserId)>,
    ratings: BTreeMap<(ProblemId, UserId), RatingValue>,
    flags: BTreeMap<(ProblemId, UserId), FlagRecord>,
}

impl Tables {
    fn user(&self, id: UserId) -> Result<&UserRecord, StoreError> {
        self.users.get(&id).ok_or(StoreError::UserNotFound(id))
    }

    fn require_problem(&self, id: ProblemId) -> Result<&ProblemRecord, StoreError> {
        self.problems.get(&id).ok_or(StoreError::ProblemNotFound(id))
    }

    fn average_for(&self, problem: ProblemId) -> f64 {
        civic_core::average_rating(
            self.ratings
                .iter()
                .filter(|((p, _), _)| *p == problem)
                .map(|(_, v)| *v),
        )
    }
}

/// Thread-safe, cloneable in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut t = self.tables.lock();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        t.last_user_id += 1;
        let record = UserRecord {
            id: UserId::new(t.last_user_id),
            name: user.name,
            email: user.email,
            is_government: user.is_government,
            is_banned: false,
            banned_at: None,
            banned_by: None,
            coins: 0,
            created_at: Utc::now(),
        };
        t.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn ban_user(
        &self,
        target: UserId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError> {
        let mut t = self.tables.lock();
        let user = t.users.get_mut(&target).ok_or(StoreError::UserNotFound(target))?;
        ensure_bannable(target, user.is_government)?;
        user.is_banned = true;
        user.banned_at = Some(at);
        user.banned_by = Some(by);
        Ok(user.clone())
    }

    async fn unban_user(&self, target: UserId) -> Result<UserRecord, StoreError> {
        let mut t = self.tables.lock();
        let user = t.users.get_mut(&target).ok_or(StoreError::UserNotFound(target))?;
        user.is_banned = false;
        user.banned_at = None;
        user.banned_by = None;
        Ok(user.clone())
    }

    async fn create_problem(
        &self,
        problem: NewProblem,
        reward: i64,
    ) -> Result<ProblemRecord, StoreError> {
        let mut guard = self.tables.lock();
        let t = &mut *guard;
        let owner = t
            .users
            .get_mut(&problem.owner)
            .ok_or(StoreError::UserNotFound(problem.owner))?;

        t.last_problem_id += 1;
        let now = Utc::now();
        let record = ProblemRecord {
            id: ProblemId::new(t.last_problem_id),
            title: problem.title,
            description: problem.description,
            category: problem.category,
            image_url: problem.image_url,
            location: problem.location,
            status: ProblemStatus::Reported,
            vote_count: 0,
            rating: 0.0,
            cluster_id: problem.cluster_id,
            user_id: problem.owner,
            created_at: now,
            updated_at: now,
        };
        owner.coins += reward;
        t.problems.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_problem(&self, id: ProblemId) -> Result<Option<ProblemRecord>, StoreError> {
        Ok(self.tables.lock().problems.get(&id).cloned())
    }

    async fn list_problems_near(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<NearbyProblem>, StoreError> {
        let t = self.tables.lock();
        let mut nearby: Vec<NearbyProblem> = t
            .problems
            .values()
            .filter_map(|p| {
                let point = p.location.point().ok()?;
                let distance_km = haversine_km(center, point);
                (distance_km <= radius_km).then(|| NearbyProblem {
                    problem: p.clone(),
                    distance_km,
                    user_name: t
                        .users
                        .get(&p.user_id)
                        .map(|u| u.name.clone())
                        .unwrap_or_default(),
                })
            })
            .collect();
        nearby.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.problem.id.cmp(&b.problem.id))
        });
        Ok(nearby)
    }

    async fn delete_problem(&self, id: ProblemId, requester: UserId) -> Result<(), StoreError> {
        let mut t = self.tables.lock();
        let problem = t.require_problem(id)?;
        ensure_deletable(problem.status, problem.user_id, requester)?;
        t.problems.remove(&id);
        t.votes.retain(|(p, _)| *p != id);
        t.ratings.retain(|(p, _), _| *p != id);
        t.flags.retain(|(p, _), _| *p != id);
        Ok(())
    }

    async fn toggle_vote(
        &self,
        user: UserId,
        problem: ProblemId,
    ) -> Result<VoteOutcome, StoreError> {
        let mut guard = self.tables.lock();
        let t = &mut *guard;
        t.user(user)?;
        let record = t
            .problems
            .get_mut(&problem)
            .ok_or(StoreError::ProblemNotFound(problem))?;

        let voted = if t.votes.remove(&(problem, user)) {
            record.vote_count -= 1;
            false
        } else {
            t.votes.insert((problem, user));
            record.vote_count += 1;
            true
        };
        Ok(VoteOutcome {
            voted,
            vote_count: record.vote_count,
        })
    }

    async fn has_voted(&self, user: UserId, problem: ProblemId) -> Result<bool, StoreError> {
        Ok(self.tables.lock().votes.contains(&(problem, user)))
    }

    async fn upsert_rating(
        &self,
        user: UserId,
        problem: ProblemId,
        value: RatingValue,
    ) -> Result<f64, StoreError> {
        let mut t = self.tables.lock();
        t.user(user)?;
        t.require_problem(problem)?;
        t.ratings.insert((problem, user), value);
        let average = t.average_for(problem);
        if let Some(record) = t.problems.get_mut(&problem) {
            record.rating = average;
        }
        Ok(average)
    }

    async fn average_rating(&self, problem: ProblemId) -> Result<f64, StoreError> {
        Ok(self.tables.lock().average_for(problem))
    }

    async fn user_rating(
        &self,
        user: UserId,
        problem: ProblemId,
    ) -> Result<Option<RatingValue>, StoreError> {
        Ok(self.tables.lock().ratings.get(&(problem, user)).copied())
    }

    async fn insert_flag(
        &self,
        user: UserId,
        problem: ProblemId,
        reason: String,
    ) -> Result<FlagRecord, StoreError> {
        let mut t = self.tables.lock();
        t.user(user)?;
        t.require_problem(problem)?;
        if t.flags.contains_key(&(problem, user)) {
            return Err(StoreError::DuplicateFlag { user, problem });
        }
        t.last_flag_id += 1;
        let record = FlagRecord {
            id: FlagId::new(t.last_flag_id),
            user_id: user,
            problem_id: problem,
            reason,
            created_at: Utc::now(),
        };
        t.flags.insert((problem, user), record.clone());
        Ok(record)
    }

    async fn delete_flag(&self, user: UserId, problem: ProblemId) -> Result<(), StoreError> {
        self.tables
            .lock()
            .flags
            .remove(&(problem, user))
            .map(|_| ())
            .ok_or(StoreError::FlagNotFound { user, problem })
    }

    async fn flag_count(&self, problem: ProblemId) -> Result<i64, StoreError> {
        let t = self.tables.lock();
        Ok(t.flags.keys().filter(|(p, _)| *p == problem).count() as i64)
    }

    async fn list_flags(&self) -> Result<Vec<FlaggedIssueView>, StoreError> {
        let t = self.tables.lock();
        let mut views = Vec::with_capacity(t.flags.len());
        for flag in t.flags.values() {
            let (Some(problem), Some(flagger)) =
                (t.problems.get(&flag.problem_id), t.users.get(&flag.user_id))
            else {
                continue;
            };
            let Some(owner) = t.users.get(&problem.user_id) else {
                continue;
            };
            views.push(FlaggedIssueView {
                flag: flag.clone(),
                problem: FlaggedProblem {
                    problem: problem.clone(),
                    user: owner.summary(),
                },
                user: flagger.summary(),
            });
        }
        views.sort_by(|a, b| {
            b.flag
                .created_at
                .cmp(&a.flag.created_at)
                .then(b.flag.id.cmp(&a.flag.id))
        });
        Ok(views)
    }

    async fn apply_transition(
        &self,
        problem: ProblemId,
        transition: StatusTransition,
        policy: TransitionPolicy,
    ) -> Result<ProblemRecord, StoreError> {
        let mut guard = self.tables.lock();
        let t = &mut *guard;
        let record = t
            .problems
            .get_mut(&problem)
            .ok_or(StoreError::ProblemNotFound(problem))?;
        let next = transition.apply(record.status, policy)?;
        let owner = t
            .users
            .get_mut(&record.user_id)
            .ok_or(StoreError::UserNotFound(record.user_id))?;

        record.status = next;
        record.updated_at = Utc::now();
        owner.coins += transition.coin_delta();
        Ok(record.clone())
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, StoreError> {
        let t = self.tables.lock();
        let count_status = |status: ProblemStatus| {
            t.problems.values().filter(|p| p.status == status).count() as i64
        };
        Ok(AnalyticsSnapshot {
            user_stats: UserStats {
                total_users: t.users.len() as i64,
                banned_users: t.users.values().filter(|u| u.is_banned).count() as i64,
            },
            problem_stats: ProblemStats {
                total_problems: t.problems.len() as i64,
                reported_problems: count_status(ProblemStatus::Reported),
                in_progress_problems: count_status(ProblemStatus::InProgress),
                completed_problems: count_status(ProblemStatus::Completed),
                rejected_problems: count_status(ProblemStatus::Rejected),
                flagged_problems: t.flags.len() as i64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::{IssueCategory, Location};
    use civic_state::{BanError, DeletionError, TransitionError};

    async fn user(store: &MemoryStore, name: &str, gov: bool) -> UserRecord {
        store
            .insert_user(NewUser {
                name: name.to_string(),
                email: format!("{name}@example.org"),
                is_government: gov,
            })
            .await
            .unwrap()
    }

    async fn problem_at(store: &MemoryStore, owner: UserId, lat: f64, lng: f64) -> ProblemRecord {
        store
            .create_problem(
                NewProblem {
                    owner,
                    title: "Broken street light".into(),
                    description: "Dark at night".into(),
                    category: IssueCategory::Lighting,
                    image_url: "https://img.example.org/1.jpg".into(),
                    location: Location {
                        lat,
                        lng,
                        address: None,
                    },
                    cluster_id: 1,
                },
                0,
            )
            .await
            .unwrap()
    }

    fn rating(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    #[tokio::test]
    async fn create_problem_credits_reward() {
        let store = MemoryStore::new();
        let u = user(&store, "asha", false).await;
        let p = store
            .create_problem(
                NewProblem {
                    owner: u.id,
                    title: "t".into(),
                    description: "d".into(),
                    category: IssueCategory::Road,
                    image_url: "i".into(),
                    location: Location {
                        lat: 1.0,
                        lng: 1.0,
                        address: Some("Main St".into()),
                    },
                    cluster_id: 3,
                },
                5,
            )
            .await
            .unwrap();
        assert_eq!(p.status, ProblemStatus::Reported);
        assert_eq!(p.vote_count, 0);
        assert_eq!(store.get_user(u.id).await.unwrap().unwrap().coins, 5);
    }

    #[tokio::test]
    async fn create_problem_for_unknown_owner_fails() {
        let store = MemoryStore::new();
        let err = store
            .create_problem(
                NewProblem {
                    owner: UserId::new(99),
                    title: "t".into(),
                    description: "d".into(),
                    category: IssueCategory::Road,
                    image_url: "i".into(),
                    location: Location {
                        lat: 0.0,
                        lng: 0.0,
                        address: None,
                    },
                    cluster_id: 1,
                },
                5,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(_)));
        assert_eq!(store.analytics().await.unwrap().problem_stats.total_problems, 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let store = MemoryStore::new();
        user(&store, "asha", false).await;
        let err = store
            .insert_user(NewUser {
                name: "other".into(),
                email: "asha@example.org".into(),
                is_government: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn vote_toggle_is_its_own_inverse() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let voter = user(&store, "voter", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        let first = store.toggle_vote(voter.id, p.id).await.unwrap();
        assert_eq!(first, VoteOutcome { voted: true, vote_count: 1 });
        assert!(store.has_voted(voter.id, p.id).await.unwrap());

        let second = store.toggle_vote(voter.id, p.id).await.unwrap();
        assert_eq!(second, VoteOutcome { voted: false, vote_count: 0 });
        assert!(!store.has_voted(voter.id, p.id).await.unwrap());
    }

    #[tokio::test]
    async fn vote_on_missing_problem_is_not_found() {
        let store = MemoryStore::new();
        let voter = user(&store, "voter", false).await;
        let err = store.toggle_vote(voter.id, ProblemId::new(42)).await.unwrap_err();
        assert!(matches!(err, StoreError::ProblemNotFound(id) if id == ProblemId::new(42)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_votes_are_all_counted() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        let mut voters = Vec::new();
        for i in 0..32 {
            voters.push(user(&store, &format!("v{i}"), false).await.id);
        }

        let handles: Vec<_> = voters
            .into_iter()
            .map(|v| {
                let store = store.clone();
                tokio::spawn(async move { store.toggle_vote(v, p.id).await })
            })
            .collect();
        for h in handles {
            assert!(h.await.unwrap().unwrap().voted);
        }

        let stored = store.get_problem(p.id).await.unwrap().unwrap();
        assert_eq!(stored.vote_count, 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_on_one_pair_leave_count_matching_row() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let voter = user(&store, "voter", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        let handles: Vec<_> = (0..51)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.toggle_vote(voter.id, p.id).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let voted = store.has_voted(voter.id, p.id).await.unwrap();
        let stored = store.get_problem(p.id).await.unwrap().unwrap();
        assert!(voted, "an odd number of toggles leaves the vote in place");
        assert_eq!(stored.vote_count, i64::from(voted));
    }

    mod vote_counter {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn vote_count_tracks_vote_rows(
                toggles in proptest::collection::vec((0usize..4, 0usize..2), 1..40)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let store = MemoryStore::new();
                    let owner = user(&store, "owner", false).await;
                    let mut voters = Vec::new();
                    for i in 0..4 {
                        voters.push(user(&store, &format!("v{i}"), false).await.id);
                    }
                    let problems = [
                        problem_at(&store, owner.id, 0.0, 0.0).await.id,
                        problem_at(&store, owner.id, 1.0, 1.0).await.id,
                    ];
                    let mut rows: BTreeSet<(usize, usize)> = BTreeSet::new();

                    for (v, p) in toggles {
                        let outcome = store.toggle_vote(voters[v], problems[p]).await.unwrap();
                        let now_voted = rows.insert((v, p)) || {
                            rows.remove(&(v, p));
                            false
                        };
                        assert_eq!(outcome.voted, now_voted);

                        for (pi, problem) in problems.iter().enumerate() {
                            let expected = rows.iter().filter(|(_, rp)| *rp == pi).count() as i64;
                            let stored = store.get_problem(*problem).await.unwrap().unwrap();
                            assert_eq!(stored.vote_count, expected);
                            let stored_rows = store
                                .tables
                                .lock()
                                .votes
                                .iter()
                                .filter(|(vp, _)| vp == problem)
                                .count() as i64;
                            assert_eq!(stored_rows, expected);
                            for (vi, voter) in voters.iter().enumerate() {
                                assert_eq!(
                                    store.has_voted(*voter, *problem).await.unwrap(),
                                    rows.contains(&(vi, pi))
                                );
                            }
                        }
                    }
                });
            }
        }
    }

    #[tokio::test]
    async fn rating_overwrite_keeps_one_row() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let rater = user(&store, "rater", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        assert_eq!(store.upsert_rating(rater.id, p.id, rating(3)).await.unwrap(), 3.0);
        assert_eq!(store.upsert_rating(rater.id, p.id, rating(5)).await.unwrap(), 5.0);
        assert_eq!(store.user_rating(rater.id, p.id).await.unwrap(), Some(rating(5)));
        assert_eq!(store.get_problem(p.id).await.unwrap().unwrap().rating, 5.0);
    }

    #[tokio::test]
    async fn average_over_distinct_users() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        let mut last = 0.0;
        for (i, v) in [4, 5, 3].into_iter().enumerate() {
            let u = user(&store, &format!("r{i}"), false).await;
            last = store.upsert_rating(u.id, p.id, rating(v)).await.unwrap();
        }
        assert_eq!(last, 4.0);
        assert_eq!(store.average_rating(p.id).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn unrated_problem_averages_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.average_rating(ProblemId::new(1)).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn duplicate_flag_conflicts_and_count_stays_one() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let flagger = user(&store, "flagger", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        store.insert_flag(flagger.id, p.id, "spam".into()).await.unwrap();
        let err = store
            .insert_flag(flagger.id, p.id, "spam again".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateFlag { .. }));
        assert_eq!(store.flag_count(p.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unflag_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete_flag(UserId::new(1), ProblemId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FlagNotFound { .. }));
    }

    #[tokio::test]
    async fn list_flags_joins_and_orders_newest_first() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let a = user(&store, "a", false).await;
        let b = user(&store, "b", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;

        store.insert_flag(a.id, p.id, "first".into()).await.unwrap();
        store.insert_flag(b.id, p.id, "second".into()).await.unwrap();

        let flags = store.list_flags().await.unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].flag.reason, "second");
        assert_eq!(flags[0].user.name, "b");
        assert_eq!(flags[0].problem.user.name, "owner");
        assert_eq!(flags[1].flag.reason, "first");
    }

    #[tokio::test]
    async fn government_account_cannot_be_banned() {
        let store = MemoryStore::new();
        let official = user(&store, "official", true).await;
        let other = user(&store, "other", true).await;
        let err = store
            .ban_user(other.id, official.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Ban(BanError::ProtectedAccount(_))));
        assert!(!store.get_user(other.id).await.unwrap().unwrap().is_banned);
    }

    #[tokio::test]
    async fn ban_then_unban_round_trips_audit_fields() {
        let store = MemoryStore::new();
        let official = user(&store, "official", true).await;
        let citizen = user(&store, "citizen", false).await;

        let banned = store
            .ban_user(citizen.id, official.id, Utc::now())
            .await
            .unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.banned_by, Some(official.id));
        assert!(banned.banned_at.is_some());

        let unbanned = store.unban_user(citizen.id).await.unwrap();
        assert!(!unbanned.is_banned);
        assert_eq!(unbanned.banned_by, None);
        assert_eq!(unbanned.banned_at, None);
    }

    #[tokio::test]
    async fn approve_and_reject_adjust_owner_coins() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p1 = problem_at(&store, owner.id, 0.0, 0.0).await;
        let p2 = problem_at(&store, owner.id, 0.0, 0.0).await;

        let approved = store
            .apply_transition(p1.id, StatusTransition::Approve, TransitionPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(approved.status, ProblemStatus::InProgress);
        assert_eq!(store.get_user(owner.id).await.unwrap().unwrap().coins, 10);

        let rejected = store
            .apply_transition(p2.id, StatusTransition::Reject, TransitionPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(rejected.status, ProblemStatus::Rejected);
        assert_eq!(store.get_user(owner.id).await.unwrap().unwrap().coins, 5);
    }

    #[tokio::test]
    async fn rejection_can_drive_balance_negative() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        store
            .apply_transition(p.id, StatusTransition::Reject, TransitionPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(store.get_user(owner.id).await.unwrap().unwrap().coins, -5);
    }

    #[tokio::test]
    async fn refused_transition_changes_nothing() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        let err = store
            .apply_transition(p.id, StatusTransition::Complete, TransitionPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transition(TransitionError::InvalidTransition { .. })
        ));
        let stored = store.get_problem(p.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProblemStatus::Reported);
        assert_eq!(store.get_user(owner.id).await.unwrap().unwrap().coins, 0);
    }

    #[tokio::test]
    async fn transition_with_missing_owner_leaves_status_unchanged() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        store.tables.lock().users.remove(&owner.id);

        let err = store
            .apply_transition(p.id, StatusTransition::Approve, TransitionPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(id) if id == owner.id));

        let stored = store.get_problem(p.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProblemStatus::Reported);
        assert_eq!(stored.updated_at, p.updated_at);
    }

    #[tokio::test]
    async fn permissive_policy_completes_rejected() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        store
            .apply_transition(p.id, StatusTransition::Reject, TransitionPolicy::Permissive)
            .await
            .unwrap();
        let done = store
            .apply_transition(p.id, StatusTransition::Complete, TransitionPolicy::Permissive)
            .await
            .unwrap();
        assert_eq!(done.status, ProblemStatus::Completed);
    }

    #[tokio::test]
    async fn delete_cascades_and_respects_guard() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let other = user(&store, "other", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        store.toggle_vote(other.id, p.id).await.unwrap();
        store.upsert_rating(other.id, p.id, rating(2)).await.unwrap();
        store.insert_flag(other.id, p.id, "x".into()).await.unwrap();

        let err = store.delete_problem(p.id, other.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Deletion(DeletionError::NotOwner { .. })));

        store.delete_problem(p.id, owner.id).await.unwrap();
        assert!(store.get_problem(p.id).await.unwrap().is_none());
        assert!(!store.has_voted(other.id, p.id).await.unwrap());
        assert_eq!(store.user_rating(other.id, p.id).await.unwrap(), None);
        assert_eq!(store.flag_count(p.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn triaged_problem_cannot_be_deleted() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let p = problem_at(&store, owner.id, 0.0, 0.0).await;
        store
            .apply_transition(p.id, StatusTransition::Approve, TransitionPolicy::Strict)
            .await
            .unwrap();
        let err = store.delete_problem(p.id, owner.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Deletion(DeletionError::NotReported { .. })));
    }

    #[tokio::test]
    async fn nearby_filters_and_sorts_by_distance() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner", false).await;
        let far = problem_at(&store, owner.id, 22.60, 72.93).await; // ~4 km
        let near = problem_at(&store, owner.id, 22.57, 72.93).await; // <1 km
        problem_at(&store, owner.id, 23.50, 72.93).await; // ~100 km

        let center = GeoPoint::new(22.5645, 72.9289).unwrap();
        let found = store.list_problems_near(center, 5.0).await.unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.problem.id).collect();
        assert_eq!(ids, vec![near.id, far.id]);
        assert!(found[0].distance_km < found[1].distance_km);
        assert_eq!(found[0].user_name, "owner");
    }

    #[tokio::test]
    async fn analytics_counts_by_status_and_flag_rows() {
        let store = MemoryStore::new();
        let gov = user(&store, "gov", true).await;
        let owner = user(&store, "owner", false).await;
        let flagger = user(&store, "flagger", false).await;
        let p1 = problem_at(&store, owner.id, 0.0, 0.0).await;
        let p2 = problem_at(&store, owner.id, 0.0, 0.0).await;
        problem_at(&store, owner.id, 0.0, 0.0).await;

        store
            .apply_transition(p1.id, StatusTransition::Approve, TransitionPolicy::Strict)
            .await
            .unwrap();
        store
            .apply_transition(p2.id, StatusTransition::Reject, TransitionPolicy::Strict)
            .await
            .unwrap();
        store.insert_flag(flagger.id, p1.id, "x".into()).await.unwrap();
        store.insert_flag(owner.id, p1.id, "y".into()).await.unwrap();
        store.ban_user(flagger.id, gov.id, Utc::now()).await.unwrap();

        let snap = store.analytics().await.unwrap();
        assert_eq!(snap.user_stats, UserStats { total_users: 3, banned_users: 1 });
        assert_eq!(
            snap.problem_stats,
            ProblemStats {
                total_problems: 3,
                reported_problems: 1,
                in_progress_problems: 1,
                completed_problems: 0,
                rejected_problems: 1,
                flagged_problems: 2,
            }
        );
    }
}
