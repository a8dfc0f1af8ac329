//! The roster control loop
//!
//! A session subscribes to the three roster collections and keeps the
//! latest pushed values in a [`RosterState`] snapshot. Intents never touch
//! that snapshot: they compute the next state on a copy, write the changed
//! collections through the store, and wait for the written values to come
//! back as pushes. Local state therefore only ever reflects confirmed data.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::credential::CredentialGate;
use crate::core::entity::{default_units, Personnel, PersonnelPatch, Unit};
use crate::core::error::{Result, RosterError, UnitError};
use crate::core::identity::new_personnel_id;
use crate::core::roster::RosterIndex;
use crate::core::transfer::{parse_import, ExportData};
use crate::core::units::{DeleteOutcome, UnitTree};
use crate::store::{
    BackendKind, CurrentUnit, PersonnelGroups, StoreAdapter, StorePath, Subscription, UnitList,
};

/// How long to wait for the store to deliver data
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Latest confirmed roster data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterState {
    pub units: UnitTree,
    pub roster: RosterIndex,
    pub current_unit_id: String,
    awaiting: Awaiting,
    units_loaded: bool,
    roster_loaded: bool,
    current_loaded: bool,
}

impl RosterState {
    /// Every collection has delivered at least once
    pub fn is_loaded(&self) -> bool {
        self.units_loaded && self.roster_loaded && self.current_loaded
    }

    /// The selected unit, or the first unit in display order when the
    /// selection is missing or stale
    pub fn current_unit(&self) -> Option<&Unit> {
        self.units
            .get(&self.current_unit_id)
            .or_else(|| self.units.ordered().into_iter().next())
    }

    /// Resolve an explicit unit id, defaulting to the current unit
    pub fn resolve_unit(&self, unit_id: Option<&str>) -> Result<&Unit> {
        match unit_id {
            Some(id) => self
                .units
                .get(id)
                .ok_or_else(|| UnitError::UnknownUnit(id.to_string()).into()),
            None => self
                .current_unit()
                .ok_or_else(|| UnitError::UnknownUnit(self.current_unit_id.clone()).into()),
        }
    }
}

/// Values written by the running intent that have not been pushed back yet
///
/// Each slot clears when a push on its path carries exactly the written
/// value. Pushes on other paths, or other writers' values, leave it set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Awaiting {
    units: Option<UnitTree>,
    roster: Option<RosterIndex>,
    current_unit_id: Option<String>,
}

impl Awaiting {
    fn is_settled(&self) -> bool {
        self.units.is_none() && self.roster.is_none() && self.current_unit_id.is_none()
    }
}

/// Collections one intent writes in a single step
#[derive(Debug, Default, Clone, Copy)]
struct Changes<'a> {
    units: Option<&'a UnitTree>,
    roster: Option<&'a RosterIndex>,
    current_unit_id: Option<&'a str>,
}

impl<'a> Changes<'a> {
    fn units(units: &'a UnitTree) -> Self {
        Self {
            units: Some(units),
            ..Default::default()
        }
    }

    fn roster(roster: &'a RosterIndex) -> Self {
        Self {
            roster: Some(roster),
            ..Default::default()
        }
    }
}

/// A live view of the roster with intent methods
pub struct RosterSession {
    store: Arc<StoreAdapter>,
    sender: Arc<watch::Sender<RosterState>>,
    state: watch::Receiver<RosterState>,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for RosterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterSession")
            .field("store", &self.store)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl RosterSession {
    /// Seed defaults if needed, subscribe, and wait for the first data
    pub async fn open(store: Arc<StoreAdapter>) -> Result<Self> {
        Self::seed_defaults(&store).await?;

        let (tx, rx) = watch::channel(RosterState::default());
        let tx = Arc::new(tx);

        let units_tx = tx.clone();
        let roster_tx = tx.clone();
        let current_tx = tx.clone();
        let (units_sub, roster_sub, current_sub) = tokio::try_join!(
            store.watch::<UnitList, _>(move |units| {
                units_tx.send_modify(|s| {
                    if s.awaiting.units.as_ref() == Some(&units) {
                        s.awaiting.units = None;
                    }
                    s.units = if units.is_empty() {
                        UnitTree::new(default_units())
                    } else {
                        units
                    };
                    s.units_loaded = true;
                });
            }),
            store.watch::<PersonnelGroups, _>(move |roster| {
                roster_tx.send_modify(|s| {
                    if s.awaiting.roster.as_ref().is_some_and(|w| w.same_records(&roster)) {
                        s.awaiting.roster = None;
                    }
                    s.roster = roster;
                    s.roster_loaded = true;
                });
            }),
            store.watch::<CurrentUnit, _>(move |id| {
                current_tx.send_modify(|s| {
                    if s.awaiting.current_unit_id.as_ref() == Some(&id) {
                        s.awaiting.current_unit_id = None;
                    }
                    if !id.is_empty() {
                        s.current_unit_id = id;
                    }
                    s.current_loaded = true;
                });
            }),
        )?;

        let session = Self {
            store,
            sender: tx,
            state: rx,
            subscriptions: vec![units_sub, roster_sub, current_sub],
        };
        session.wait_until(RosterState::is_loaded).await?;
        tracing::debug!(backend = %session.backend_kind(), "roster session ready");
        Ok(session)
    }

    async fn seed_defaults(store: &StoreAdapter) -> Result<()> {
        if store.read(StorePath::Units).await?.is_some() {
            // surface a malformed store now rather than as skipped pushes
            store.load::<UnitList>().await?;
            store.load::<PersonnelGroups>().await?;
            store.load::<CurrentUnit>().await?;
            return Ok(());
        }

        tracing::info!("seeding default units");
        let units = UnitTree::new(default_units());
        store.save::<UnitList>(&units).await?;
        if store.load::<CurrentUnit>().await?.is_empty() {
            if let Some(first) = units.units().first() {
                store.save::<CurrentUnit>(&first.id).await?;
            }
        }
        if store.read(StorePath::PersonnelByUnit).await?.is_none() {
            store.save::<PersonnelGroups>(&RosterIndex::default()).await?;
        }
        Ok(())
    }

    /// Latest confirmed state
    pub fn snapshot(&self) -> RosterState {
        self.state.borrow().clone()
    }

    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.store.backend_kind()
    }

    /// Wait for a state satisfying `pred`, up to [`LOAD_TIMEOUT`]
    pub async fn wait_until<F>(&self, mut pred: F) -> Result<RosterState>
    where
        F: FnMut(&RosterState) -> bool,
    {
        let mut rx = self.state.clone();
        let waited = tokio::time::timeout(LOAD_TIMEOUT, async move {
            rx.wait_for(|s| pred(s)).await.map(|s| s.clone())
        })
        .await;
        match waited {
            Ok(Ok(state)) => Ok(state),
            _ => Err(RosterError::LoadTimeout),
        }
    }

    /// Write `changes` and wait until every written value is pushed back
    ///
    /// Personnel go first so no push shows records under a unit that is
    /// gone.
    async fn commit(&self, changes: Changes<'_>) -> Result<()> {
        self.sender.send_modify(|s| {
            s.awaiting = Awaiting {
                units: changes.units.cloned(),
                roster: changes.roster.cloned(),
                current_unit_id: changes.current_unit_id.map(str::to_string),
            };
        });

        let confirmed = match self.write(changes).await {
            Ok(()) => self.wait_until(|s| s.awaiting.is_settled()).await.map(drop),
            Err(e) => Err(e),
        };
        if confirmed.is_err() {
            self.sender.send_modify(|s| s.awaiting = Awaiting::default());
        }
        confirmed
    }

    async fn write(&self, changes: Changes<'_>) -> Result<()> {
        if let Some(roster) = changes.roster {
            self.store.save::<PersonnelGroups>(roster).await?;
        }
        if let Some(units) = changes.units {
            self.store.save::<UnitList>(units).await?;
        }
        if let Some(id) = changes.current_unit_id {
            self.store.save::<CurrentUnit>(&id.to_string()).await?;
        }
        Ok(())
    }

    /// Stop every subscription
    pub fn close(self) {
        for sub in self.subscriptions {
            sub.unsubscribe();
        }
    }

    pub fn passkey(&self) -> CredentialGate<'_> {
        CredentialGate::new(&self.store)
    }

    pub async fn create_unit(&self, name: &str, parent_id: Option<&str>) -> Result<Unit> {
        let state = self.snapshot();
        let mut units = state.units;
        let unit = units.create(name, parent_id)?;
        self.commit(Changes::units(&units)).await?;
        tracing::debug!(unit = %unit.id, "unit created");
        Ok(unit)
    }

    /// Rename and reparent together; returns the personnel records whose
    /// unit references were rewritten
    pub async fn edit_unit(
        &self,
        id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<usize> {
        let state = self.snapshot();
        let (mut units, mut roster) = (state.units, state.roster);
        let touched = units.edit(id, name, parent_id, &mut roster)?;
        self.commit(Changes {
            units: Some(&units),
            roster: (touched > 0).then_some(&roster),
            ..Default::default()
        })
        .await?;
        Ok(touched)
    }

    pub async fn rename_unit(&self, id: &str, name: &str) -> Result<usize> {
        let state = self.snapshot();
        let (mut units, mut roster) = (state.units, state.roster);
        let touched = units.rename(id, name, &mut roster)?;
        self.commit(Changes {
            units: Some(&units),
            roster: (touched > 0).then_some(&roster),
            ..Default::default()
        })
        .await?;
        Ok(touched)
    }

    pub async fn reparent_unit(&self, id: &str, parent_id: Option<&str>) -> Result<()> {
        let state = self.snapshot();
        let mut units = state.units;
        units.reparent(id, parent_id)?;
        self.commit(Changes::units(&units)).await
    }

    pub async fn set_unit_sort_order(&self, id: &str, sort_order: Option<i64>) -> Result<()> {
        let state = self.snapshot();
        let mut units = state.units;
        units.set_sort_order(id, sort_order)?;
        self.commit(Changes::units(&units)).await
    }

    /// Delete a unit, moving its personnel to `reassign_to`
    ///
    /// If the deleted unit was selected, the selection moves to the first
    /// remaining unit.
    pub async fn delete_unit(&self, id: &str, reassign_to: &str) -> Result<DeleteOutcome> {
        let state = self.snapshot();
        let (mut units, mut roster) = (state.units, state.roster.clone());
        let outcome = units.delete(id, reassign_to, &mut roster)?;

        let roster_changed = roster != state.roster;
        self.commit(Changes {
            units: Some(&units),
            roster: roster_changed.then_some(&roster),
            ..Default::default()
        })
        .await?;

        if state.current_unit_id == id {
            if let Some(next) = units.ordered().first() {
                self.select_unit(&next.id).await?;
            }
        }
        tracing::debug!(unit = id, moved = outcome.reassigned_personnel, "unit deleted");
        Ok(outcome)
    }

    /// Make `id` the context unit for new personnel
    pub async fn select_unit(&self, id: &str) -> Result<()> {
        let state = self.snapshot();
        if !state.units.contains(id) {
            return Err(UnitError::UnknownUnit(id.to_string()).into());
        }
        self.commit(Changes {
            current_unit_id: Some(id),
            ..Default::default()
        })
        .await
    }

    /// Add a record under `unit_id`, or under the current unit
    ///
    /// A fresh id is generated when the draft has none, and
    /// `assigned_unit` is set to the owning unit's name.
    pub async fn add_personnel(&self, draft: Personnel, unit_id: Option<&str>) -> Result<Personnel> {
        let state = self.snapshot();
        let unit = state.resolve_unit(unit_id)?.clone();

        let mut person = draft;
        if person.id.is_empty() {
            person.id = new_personnel_id();
        }
        person.assigned_unit.clone_from(&unit.name);

        let mut roster = state.roster;
        roster.insert(&unit.id, person.clone());
        self.commit(Changes::roster(&roster)).await?;
        tracing::debug!(personnel = %person.id, unit = %unit.id, "personnel added");
        Ok(person)
    }

    /// Apply a partial update; false when no record has that id
    pub async fn update_personnel(&self, id: &str, patch: &PersonnelPatch) -> Result<bool> {
        let state = self.snapshot();
        if let Some(name) = patch.assigned_unit.as_deref() {
            if state.units.find_by_name(name).is_none() {
                return Err(UnitError::UnknownUnit(name.to_string()).into());
            }
        }

        let mut roster = state.roster;
        if !roster.update(id, patch, &state.units) {
            return Ok(false);
        }
        self.commit(Changes::roster(&roster)).await?;
        Ok(true)
    }

    /// Move a record to another unit; false when no record has that id
    pub async fn reassign_personnel(&self, id: &str, unit_id: &str) -> Result<bool> {
        let state = self.snapshot();
        let target = state.resolve_unit(Some(unit_id))?.clone();

        let mut roster = state.roster;
        if !roster.reassign(id, &target) {
            return Ok(false);
        }
        self.commit(Changes::roster(&roster)).await?;
        Ok(true)
    }

    /// Remove a record; `None` when no record has that id
    pub async fn delete_personnel(&self, id: &str) -> Result<Option<Personnel>> {
        let state = self.snapshot();
        let mut roster = state.roster;
        let Some((_, removed)) = roster.remove(id) else {
            tracing::warn!(personnel = id, "delete of unknown personnel ignored");
            return Ok(None);
        };
        self.commit(Changes::roster(&roster)).await?;
        Ok(Some(removed))
    }

    /// The current roster as an export document
    pub fn export_json(&self) -> Result<String> {
        let state = self.snapshot();
        Ok(ExportData::new(&state.units, &state.roster).to_json()?)
    }

    /// Replace units and personnel wholesale with an export document
    pub async fn import_json(&self, text: &str) -> Result<ExportData> {
        let data = parse_import(text)?;
        self.commit(Changes {
            units: Some(&data.units),
            roster: Some(&data.personnel_by_unit),
            ..Default::default()
        })
        .await?;

        let current = self.snapshot();
        if !current.units.contains(&current.current_unit_id) {
            if let Some(first) = current.units.ordered().first() {
                self.select_unit(&first.id).await?;
            }
        }
        tracing::info!(
            units = data.units.len(),
            personnel = data.personnel_by_unit.len(),
            "roster imported"
        );
        Ok(data)
    }
}
