// 🔎 Filter Engine - catalog + cached query results + user selections
//
// Lifecycle:
//   add_record (many) → finalize (once) → set_params / refresh (many)
//
// refresh() only does work when the query parameters differ from the
// snapshot that produced the current display list. Popularity is
// recomputed only when the year window moved; the working list is
// re-sorted only when the sort mode or the window moved.

use crate::config::CatalogConfig;
use crate::entities::{BabyName, NameId, Sex};
use crate::error::{CatalogError, CatalogResult};
use crate::params::{GenderFilter, InitialFilter, QueryParams, ResultLimit, SortMode, YearWindow};
use crate::selection::{SelectionRegistry, UserId};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct FilterEngine {
    config: CatalogConfig,

    // ========================================================================
    // CATALOG
    // ========================================================================
    /// Arena of entities; NameId indexes into it
    names: Vec<BabyName>,
    by_identity: HashMap<String, NameId>,
    /// Sortable view over the arena. Built at finalize, then only reordered.
    working: Vec<NameId>,
    finalized: bool,
    /// Stamped into every NameId; bumped by clear() so old handles go stale
    epoch: u32,

    // ========================================================================
    // QUERY STATE
    // ========================================================================
    display: Vec<String>,
    current: QueryParams,
    /// Params that produced `display`; None = nothing valid cached
    applied: Option<QueryParams>,
    /// Bumped on every recomputation of `display`
    generation: u64,

    selections: SelectionRegistry,
}

impl FilterEngine {
    pub fn new(config: CatalogConfig) -> Self {
        FilterEngine {
            config,
            names: Vec::new(),
            by_identity: HashMap::new(),
            working: Vec::new(),
            finalized: false,
            epoch: 0,
            display: Vec::new(),
            current: QueryParams::default(),
            applied: None,
            generation: 0,
            selections: SelectionRegistry::new(),
        }
    }

    /// Engine over `year_min..=year_max` with the remaining config defaulted
    pub fn with_years(year_min: i32, year_max: i32) -> CatalogResult<Self> {
        Ok(Self::new(CatalogConfig::with_years(year_min, year_max)?))
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // ========================================================================
    // INGESTION
    // ========================================================================

    /// Add one (name, sex, year, count) observation.
    ///
    /// The first record for a name creates it; a record whose sex disagrees
    /// with the name's category turns it Unisex. Re-observing the same
    /// (name, year) overwrites the count.
    pub fn add_record(&mut self, identity: &str, sex: Sex, year: i32, frequency: i64) -> CatalogResult<()> {
        if self.finalized {
            return Err(CatalogError::CatalogFinalized);
        }
        if !self.config.contains_year(year) {
            return Err(CatalogError::OutOfRangeYear {
                year,
                min: self.config.year_min,
                max: self.config.year_max,
            });
        }
        // Checked up front so a rejected record never creates an entity
        if frequency < 0 {
            return Err(CatalogError::invalid_record(
                identity,
                format!("negative frequency {} for year {}", frequency, year),
            ));
        }

        let id = match self.by_identity.get(identity) {
            Some(id) => *id,
            None => {
                let id = NameId::new(self.names.len(), self.epoch);
                self.names.push(BabyName::new(id, identity, sex)?);
                self.by_identity.insert(identity.to_string(), id);
                id
            }
        };

        let name = &mut self.names[id.index];
        name.promote_category_if_conflicting(sex);
        name.record_observation(year, frequency)
    }

    /// Backfill every name over the configured range and build the
    /// alphabetical working list. Later calls do nothing.
    pub fn finalize(&mut self) {
        if self.finalized {
            debug!("finalize: catalog already finalized");
            return;
        }

        for name in &mut self.names {
            name.backfill_missing_years(self.config.year_min, self.config.year_max);
        }

        self.working = self.names.iter().map(BabyName::id).collect();
        let names = &self.names;
        self.working.sort_unstable_by(|a, b| names[a.index].name().cmp(names[b.index].name()));

        self.finalized = true;
        // Anything computed before finalize saw an empty working list
        self.applied = None;

        info!(
            names = self.names.len(),
            year_min = self.config.year_min,
            year_max = self.config.year_max,
            "catalog finalized"
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop the whole catalog and session state so another data set can be loaded.
    ///
    /// Every `NameId` handed out before the clear is invalidated: `get`
    /// returns None for it and `set_selection` rejects it.
    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.names.clear();
        self.by_identity.clear();
        self.working.clear();
        self.display.clear();
        self.finalized = false;
        self.applied = None;
        self.selections.clear();
        info!("catalog cleared");
    }

    /// An empty, unfinalized engine that can replace this one after a reload.
    ///
    /// Config, query parameters and the active user carry over. The epoch
    /// moves on, so handles from this catalog do not resolve in the new one.
    pub(crate) fn successor(&self) -> Self {
        let mut next = Self::new(self.config.clone());
        next.epoch = self.epoch.wrapping_add(1);
        next.current = self.current;
        next.selections = SelectionRegistry::with_active(self.active_user());
        next
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    /// Replace all five parameters. Nothing is recomputed until refresh().
    pub fn set_params(&mut self, params: QueryParams) {
        self.current = params;
    }

    pub fn set_gender(&mut self, gender: GenderFilter) {
        self.current.gender = gender;
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.current.sort = sort;
    }

    pub fn set_initial(&mut self, initial: InitialFilter) {
        self.current.initial = initial;
    }

    pub fn set_years(&mut self, years: YearWindow) {
        self.current.years = years;
    }

    pub fn set_limit(&mut self, limit: ResultLimit) {
        self.current.limit = limit;
    }

    pub fn params(&self) -> QueryParams {
        self.current
    }

    pub fn applied_params(&self) -> Option<QueryParams> {
        self.applied
    }

    /// Back to defaults, and force the next refresh to recompute
    pub fn reset_params(&mut self) {
        self.current = QueryParams::default();
        self.applied = None;
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Bring the display list up to date with the current parameters.
    ///
    /// Unchanged parameters return the cached list untouched.
    pub fn refresh(&mut self) -> &[String] {
        let params = self.current;
        if self.applied == Some(params) {
            debug!(%params, "refresh: parameters unchanged, reusing display list");
            return &self.display;
        }

        self.display.clear();

        let window_changed = self.applied.map_or(true, |applied| applied.years != params.years);
        let sort_changed = self.applied.map_or(true, |applied| applied.sort != params.sort);

        if window_changed {
            // Every name, not just the visible ones: later unfiltered queries read these
            for name in &mut self.names {
                name.recompute_rolling_popularity(params.years);
            }
        }

        if window_changed || sort_changed {
            self.sort_working_list(params.sort);
        }

        for id in &self.working {
            if params.limit.is_reached(self.display.len()) {
                break;
            }
            let name = &self.names[id.index];
            if params.gender.matches(name.category()) && params.initial.matches(name.first_letter()) {
                self.display.push(name.render());
            }
        }

        self.applied = Some(params);
        self.generation += 1;

        debug!(
            %params,
            window_changed,
            sort_changed,
            entries = self.display.len(),
            generation = self.generation,
            "refresh: display list rebuilt"
        );

        &self.display
    }

    fn sort_working_list(&mut self, sort: SortMode) {
        let names = &self.names;
        match sort {
            SortMode::Alphabetical => {
                self.working
                    .sort_unstable_by(|a, b| names[a.index].name().cmp(names[b.index].name()));
            }
            SortMode::PopularityDesc => {
                self.working
                    .sort_unstable_by(|a, b| by_popularity_desc(&names[a.index], &names[b.index]));
            }
            SortMode::PopularityAsc => {
                self.working
                    .sort_unstable_by(|a, b| by_popularity_desc(&names[a.index], &names[b.index]));
                self.working.reverse();
            }
        }
    }

    /// Current display list (as of the last refresh)
    pub fn display_list(&self) -> &[String] {
        &self.display
    }

    /// Number of times the display list has been recomputed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn lookup(&self, identity: &str) -> Option<&BabyName> {
        self.by_identity.get(identity).map(|id| &self.names[id.index])
    }

    pub fn get(&self, id: NameId) -> Option<&BabyName> {
        self.names.get(id.index).filter(|_| id.epoch == self.epoch)
    }

    /// Names in current working order
    pub fn working_list(&self) -> impl Iterator<Item = &BabyName> {
        self.working.iter().map(move |id| &self.names[id.index])
    }

    /// Map rendered display entries back to catalog handles, in order.
    ///
    /// The name is the text before the first space ("Emma (80 F)" → "Emma").
    pub fn resolve_display_entries<S: AsRef<str>>(&self, entries: &[S]) -> CatalogResult<Vec<NameId>> {
        entries
            .iter()
            .map(|entry| {
                let entry = entry.as_ref().trim();
                let token = entry.split(' ').next().unwrap_or(entry);
                self.by_identity
                    .get(token)
                    .copied()
                    .ok_or_else(|| CatalogError::UnresolvedEntity(token.to_string()))
            })
            .collect()
    }

    pub fn entities(&self, ids: &[NameId]) -> Vec<&BabyName> {
        ids.iter().filter_map(|id| self.get(*id)).collect()
    }

    // ========================================================================
    // SELECTIONS
    // ========================================================================

    /// Replace the user's selection with `ids`
    pub fn set_selection(&mut self, user: u8, ids: Vec<NameId>) -> CatalogResult<()> {
        if let Some(unknown) = ids.iter().find(|id| self.get(**id).is_none()) {
            return Err(CatalogError::UnresolvedEntity(format!("#{}", unknown.index)));
        }
        let count = ids.len();
        self.selections.set(user, ids)?;
        debug!(user, names = count, "selection saved");
        Ok(())
    }

    pub fn selection(&self, user: u8) -> CatalogResult<Vec<&BabyName>> {
        let selection = self.selections.get(user)?;
        Ok(self.entities(&selection.names))
    }

    pub fn selection_ids(&self, user: u8) -> CatalogResult<&[NameId]> {
        Ok(&self.selections.get(user)?.names)
    }

    pub fn selection_saved_at(&self, user: u8) -> CatalogResult<Option<DateTime<Utc>>> {
        Ok(self.selections.get(user)?.saved_at)
    }

    pub fn set_active_user(&mut self, user: u8) -> CatalogResult<()> {
        self.selections.set_active(user)
    }

    pub fn active_user(&self) -> UserId {
        self.selections.active()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

/// Most popular first; equal popularity falls back to the name so the
/// ascending order is always the exact reverse
fn by_popularity_desc(a: &BabyName, b: &BabyName) -> Ordering {
    b.rolling_popularity()
        .cmp(&a.rolling_popularity())
        .then_with(|| a.name().cmp(b.name()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Category;

    /// Catalog over 2010..=2012:
    ///   all-years totals: Olivia 85, Emma 80, Noah 70, Liam 60,
    ///   Sophia 20, Mia 15, Ava 10, Alex 8 (unisex)
    fn sample_engine() -> FilterEngine {
        let mut engine = FilterEngine::with_years(2010, 2012).unwrap();
        let records = [
            ("Emma", Sex::Female, 2010, 50),
            ("Emma", Sex::Female, 2012, 30),
            ("Olivia", Sex::Female, 2011, 40),
            ("Olivia", Sex::Female, 2012, 45),
            ("Ava", Sex::Female, 2010, 10),
            ("Liam", Sex::Male, 2012, 60),
            ("Noah", Sex::Male, 2010, 70),
            ("Alex", Sex::Female, 2010, 5),
            ("Alex", Sex::Male, 2011, 0),
            ("Alex", Sex::Male, 2012, 3),
            ("Sophia", Sex::Female, 2011, 20),
            ("Mia", Sex::Female, 2012, 15),
        ];
        for (name, sex, year, count) in records {
            engine.add_record(name, sex, year, count).unwrap();
        }
        engine.finalize();
        engine
    }

    fn names_of(engine: &FilterEngine) -> Vec<String> {
        engine
            .display_list()
            .iter()
            .map(|entry| entry.split(' ').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_default_query_lists_everything_alphabetically() {
        let mut engine = sample_engine();
        let display = engine.refresh().to_vec();

        assert_eq!(display.len(), 8);
        assert_eq!(display[0], "Alex (8 U)");
        assert_eq!(display[1], "Ava (10 F)");
        assert_eq!(display[7], "Sophia (20 F)");
    }

    #[test]
    fn test_refresh_with_unchanged_params_is_cached() {
        let mut engine = sample_engine();
        engine.set_sort(SortMode::PopularityDesc);

        let first = engine.refresh().as_ptr();
        let first_content = engine.display_list().to_vec();
        let generation = engine.generation();

        let second = engine.refresh().as_ptr();

        assert_eq!(first, second, "cached list must be the same allocation");
        assert_eq!(engine.display_list(), first_content.as_slice());
        assert_eq!(engine.generation(), generation, "no recomputation expected");
    }

    #[test]
    fn test_category_promotion_in_either_order() {
        let mut engine = FilterEngine::with_years(2000, 2001).unwrap();
        engine.add_record("Alex", Sex::Female, 2000, 3).unwrap();
        engine.add_record("Alex", Sex::Male, 2001, 4).unwrap();
        engine.add_record("Sam", Sex::Male, 2000, 3).unwrap();
        engine.add_record("Sam", Sex::Female, 2000, 4).unwrap();
        engine.add_record("Sam", Sex::Male, 2001, 1).unwrap();
        engine.finalize();

        assert_eq!(engine.lookup("Alex").unwrap().category(), Category::Unisex);
        assert_eq!(engine.lookup("Sam").unwrap().category(), Category::Unisex);
        assert_eq!(engine.lookup("Sam").unwrap().frequency(2000), Some(4), "last write wins");
    }

    #[test]
    fn test_finalize_backfills_every_year() {
        let engine = sample_engine();

        for name in engine.working_list() {
            let years: Vec<i32> = name.history().keys().copied().collect();
            assert_eq!(years, vec![2010, 2011, 2012], "{} history incomplete", name.name());
        }
        assert_eq!(engine.lookup("Ava").unwrap().frequency(2012), Some(0));
    }

    #[test]
    fn test_finalize_twice_does_not_duplicate() {
        let mut engine = sample_engine();
        engine.finalize();

        assert_eq!(engine.working_list().count(), 8);
        assert_eq!(engine.len(), 8);
    }

    #[test]
    fn test_working_list_and_lookup_agree() {
        let engine = sample_engine();

        for name in engine.working_list() {
            let found = engine.lookup(name.name()).expect("working list entry missing from lookup");
            assert_eq!(found.id(), name.id());
        }
        assert_eq!(engine.working_list().count(), engine.len());
    }

    #[test]
    fn test_window_recompute() {
        let mut engine = sample_engine();

        engine.set_years(YearWindow::last(2));
        engine.refresh();
        assert_eq!(engine.lookup("Alex").unwrap().rolling_popularity(), 3);

        engine.set_years(YearWindow::All);
        engine.refresh();
        assert_eq!(engine.lookup("Alex").unwrap().rolling_popularity(), 8);
    }

    #[test]
    fn test_window_recompute_covers_filtered_out_names() {
        let mut engine = sample_engine();
        engine.set_params(QueryParams {
            gender: GenderFilter::Male,
            years: YearWindow::last(1),
            ..Default::default()
        });
        engine.refresh();

        assert_eq!(names_of(&engine), vec!["Liam", "Noah"]);
        assert_eq!(engine.lookup("Emma").unwrap().rolling_popularity(), 30);
        assert_eq!(engine.lookup("Olivia").unwrap().rolling_popularity(), 45);
    }

    #[test]
    fn test_limit_with_gender_filter() {
        let mut engine = sample_engine();
        engine.set_params(QueryParams {
            gender: GenderFilter::Female,
            sort: SortMode::PopularityDesc,
            limit: ResultLimit::top(2),
            ..Default::default()
        });

        assert_eq!(engine.refresh(), &["Olivia (85 F)", "Emma (80 F)"]);

        engine.set_sort(SortMode::Alphabetical);
        assert_eq!(engine.refresh(), &["Ava (10 F)", "Emma (80 F)"]);
    }

    #[test]
    fn test_limit_larger_than_matches_returns_all_matches() {
        let mut engine = sample_engine();
        engine.set_gender(GenderFilter::Unisex);
        engine.set_limit(ResultLimit::top(10));

        assert_eq!(engine.refresh(), &["Alex (8 U)"]);
    }

    #[test]
    fn test_popularity_desc_with_window_and_ties() {
        let mut engine = sample_engine();
        engine.set_sort(SortMode::PopularityDesc);
        engine.set_years(YearWindow::last(1));
        engine.refresh();

        assert_eq!(
            names_of(&engine),
            vec!["Liam", "Olivia", "Emma", "Mia", "Alex", "Ava", "Noah", "Sophia"]
        );
        assert_eq!(engine.display_list()[0], "Liam (60 M)");
    }

    #[test]
    fn test_ascending_is_exact_reverse_of_descending() {
        let mut engine = sample_engine();
        engine.set_years(YearWindow::last(1));

        engine.set_sort(SortMode::PopularityDesc);
        let desc = engine.refresh().to_vec();

        engine.set_sort(SortMode::PopularityAsc);
        let mut asc = engine.refresh().to_vec();
        asc.reverse();
        assert_eq!(asc, desc);

        // And back again, starting from the ascending order
        engine.set_sort(SortMode::PopularityDesc);
        assert_eq!(engine.refresh(), desc.as_slice());
    }

    #[test]
    fn test_initial_filter_is_case_sensitive() {
        let mut engine = sample_engine();

        engine.set_initial(InitialFilter::Letter('A'));
        engine.refresh();

        assert_eq!(names_of(&engine), vec!["Alex", "Ava"]);
    }

    #[test]
    fn test_lowercase_initial_matches_nothing() {
        let mut engine = sample_engine();
        engine.set_initial(InitialFilter::Letter('a'));

        assert!(engine.refresh().is_empty());
    }

    #[test]
    fn test_reset_params_forces_recompute() {
        let mut engine = sample_engine();
        engine.set_params(QueryParams {
            gender: GenderFilter::Male,
            sort: SortMode::PopularityAsc,
            initial: InitialFilter::Letter('N'),
            years: YearWindow::last(2),
            limit: ResultLimit::top(1),
        });
        engine.refresh();

        engine.reset_params();
        assert_eq!(engine.params(), QueryParams::default());
        assert_eq!(engine.applied_params(), None);

        let generation = engine.generation();
        engine.refresh();
        assert_eq!(engine.generation(), generation + 1);
        assert_eq!(engine.display_list().len(), 8);
        assert_eq!(engine.display_list()[0], "Alex (8 U)");

        // Reset again with defaults already in place still recomputes
        engine.reset_params();
        engine.refresh();
        assert_eq!(engine.generation(), generation + 2);
    }

    #[test]
    fn test_empty_catalog() {
        let mut engine = FilterEngine::with_years(2000, 2010).unwrap();
        engine.finalize();

        assert!(engine.is_empty());
        assert!(engine.refresh().is_empty());
    }

    #[test]
    fn test_refresh_before_finalize_is_invalidated_by_finalize() {
        let mut engine = FilterEngine::with_years(2000, 2000).unwrap();
        engine.add_record("Zoe", Sex::Female, 2000, 9).unwrap();

        assert!(engine.refresh().is_empty());

        engine.finalize();
        assert_eq!(engine.refresh(), &["Zoe (9 F)"]);
    }

    #[test]
    fn test_add_record_errors() {
        let mut engine = FilterEngine::with_years(2000, 2010).unwrap();

        assert_eq!(
            engine.add_record("Ada", Sex::Female, 1999, 1),
            Err(CatalogError::OutOfRangeYear { year: 1999, min: 2000, max: 2010 })
        );
        assert!(matches!(
            engine.add_record("Ada", Sex::Female, 2005, -4),
            Err(CatalogError::InvalidRecord { .. })
        ));
        assert!(engine.lookup("Ada").is_none(), "rejected records must not create names");
        assert!(matches!(
            engine.add_record("", Sex::Female, 2005, 4),
            Err(CatalogError::InvalidRecord { .. })
        ));

        engine.add_record("Ada", Sex::Female, 2005, 4).unwrap();
        engine.finalize();
        assert_eq!(
            engine.add_record("Ada", Sex::Female, 2006, 4),
            Err(CatalogError::CatalogFinalized)
        );
    }

    #[test]
    fn test_lookup_unknown_is_none() {
        let engine = sample_engine();
        assert!(engine.lookup("Zelda").is_none());
        assert!(engine.lookup("emma").is_none());
    }

    #[test]
    fn test_resolve_round_trip() {
        let mut engine = sample_engine();
        engine.set_sort(SortMode::PopularityDesc);
        engine.set_gender(GenderFilter::Female);
        let display = engine.refresh().to_vec();

        let ids = engine.resolve_display_entries(&display).unwrap();
        let rendered: Vec<String> = engine.entities(&ids).iter().map(|name| name.render()).collect();

        assert_eq!(rendered, display);
    }

    #[test]
    fn test_resolve_unknown_entry() {
        let engine = sample_engine();
        let err = engine
            .resolve_display_entries(&["Emma (80 F)", "Zelda (1 F)"])
            .unwrap_err();

        assert_eq!(err, CatalogError::UnresolvedEntity("Zelda".to_string()));
    }

    #[test]
    fn test_resolve_bare_name() {
        let engine = sample_engine();
        let ids = engine.resolve_display_entries(&["Liam"]).unwrap();

        assert_eq!(engine.entities(&ids)[0].name(), "Liam");
    }

    #[test]
    fn test_selection_isolation() {
        let mut engine = sample_engine();
        engine.refresh();
        let picks = engine.resolve_display_entries(&engine.display_list()[..2]).unwrap();

        engine.set_selection(1, picks).unwrap();

        let first: Vec<&str> = engine.selection(1).unwrap().iter().map(|n| n.name()).collect();
        assert_eq!(first, vec!["Alex", "Ava"]);
        assert!(engine.selection(2).unwrap().is_empty());
        assert!(engine.selection_saved_at(1).unwrap().is_some());
        assert!(engine.selection_saved_at(2).unwrap().is_none());
    }

    #[test]
    fn test_selection_rejects_bad_user_and_foreign_ids() {
        let mut engine = sample_engine();

        assert_eq!(engine.set_selection(3, vec![]), Err(CatalogError::UnknownUser(3)));
        assert!(matches!(
            engine.set_selection(1, vec![NameId::new(999, 0)]),
            Err(CatalogError::UnresolvedEntity(_))
        ));
        assert_eq!(engine.selection(0).unwrap_err(), CatalogError::UnknownUser(0));
    }

    #[test]
    fn test_active_user() {
        let mut engine = sample_engine();

        assert_eq!(engine.active_user(), UserId::FIRST);
        engine.set_active_user(2).unwrap();
        assert_eq!(engine.active_user(), UserId::SECOND);
        assert!(engine.set_active_user(5).is_err());
        assert_eq!(engine.active_user(), UserId::SECOND);
    }

    #[test]
    fn test_clear_allows_reload() {
        let mut engine = sample_engine();
        engine.refresh();
        let ava = engine.lookup("Ava").unwrap().id();
        engine.set_selection(2, vec![ava]).unwrap();

        engine.clear();
        assert!(engine.is_empty());
        assert!(!engine.is_finalized());
        assert!(engine.display_list().is_empty());
        assert!(engine.selection(2).unwrap().is_empty());

        engine.add_record("Ivy", Sex::Female, 2011, 2).unwrap();
        engine.finalize();
        assert_eq!(engine.refresh(), &["Ivy (2 F)"]);
    }

    #[test]
    fn test_handles_from_before_clear_are_rejected() {
        let mut engine = sample_engine();
        let stale = engine.lookup("Emma").unwrap().id();

        engine.clear();
        engine.add_record("Ivy", Sex::Female, 2011, 2).unwrap();
        engine.finalize();

        // Same arena slot, previous catalog
        assert_eq!(stale.index, engine.lookup("Ivy").unwrap().id().index);
        assert!(engine.get(stale).is_none());
        assert!(engine.entities(&[stale]).is_empty());
        assert!(matches!(
            engine.set_selection(1, vec![stale]),
            Err(CatalogError::UnresolvedEntity(_))
        ));
        assert!(engine.selection(1).unwrap().is_empty());

        let fresh = engine.lookup("Ivy").unwrap().id();
        engine.set_selection(1, vec![fresh]).unwrap();
        assert_eq!(engine.selection(1).unwrap()[0].name(), "Ivy");
    }

    fn old_and_new_engine() -> FilterEngine {
        let mut engine = FilterEngine::with_years(2010, 2012).unwrap();
        engine.add_record("Old", Sex::Female, 2010, 100).unwrap();
        engine.add_record("New", Sex::Female, 2012, 10).unwrap();
        engine.finalize();
        engine
    }

    #[test]
    fn test_window_change_alone_resorts_descending() {
        let mut engine = old_and_new_engine();
        engine.set_sort(SortMode::PopularityDesc);
        assert_eq!(engine.refresh(), &["Old (100 F)", "New (10 F)"]);

        engine.set_years(YearWindow::last(1));
        assert_eq!(engine.refresh(), &["New (10 F)", "Old (0 F)"]);

        engine.set_years(YearWindow::All);
        assert_eq!(engine.refresh(), &["Old (100 F)", "New (10 F)"]);
    }

    #[test]
    fn test_window_change_alone_resorts_ascending() {
        let mut engine = old_and_new_engine();
        engine.set_sort(SortMode::PopularityAsc);
        assert_eq!(engine.refresh(), &["New (10 F)", "Old (100 F)"]);

        engine.set_years(YearWindow::last(1));
        assert_eq!(engine.refresh(), &["Old (0 F)", "New (10 F)"]);
    }
}
