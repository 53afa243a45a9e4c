//! Hierarchical model over a DICOM index database

use std::cell::Ref;
use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::Executor;
use crate::config::ModelConfig;
use crate::fetch;
use crate::fetch::FetchOutcome;
use crate::fetch::InsertionNotifier;
use crate::query::Direction;
use crate::query::SortOrder;
use crate::query::KEY_FIELD;
use crate::tree::FetchState;
use crate::tree::NodeId;
use crate::tree::Tree;

use super::Field;
use super::ModelIndex;
use super::ModelObserver;
use super::Orientation;
use super::Value;

/// Tree model over the patient → study → series → image hierarchy.
///
/// Positions are created on demand the first time they are addressed and
/// cached for the lifetime of the backing store. Every node only knows as
/// many rows as consumers have asked for; [`fetch_more`](Self::fetch_more)
/// and value lookups grow that count a page at a time.
///
/// All methods take `&self` and the model is single-threaded. Observers are
/// notified without any internal borrow held, so they may call back into the
/// model while being notified.
///
/// Operations never fail: a missing backing store, a failed statement or a
/// row that does not exist all read as empty counts and absent values.
///
/// # Example
///
/// ```
/// use dicomtree_lib::backend::{schema, SqliteExecutor};
/// use dicomtree_lib::model::{Field, ModelIndex};
/// use dicomtree_lib::DicomModel;
///
/// let executor = SqliteExecutor::open_in_memory()?;
/// schema::create_tables(executor.connection())?;
/// executor.connection().execute(
///     "INSERT INTO Patients (PatientsName, PatientID) VALUES ('Doe^Jane', 'P-1')",
///     [],
/// )?;
///
/// let model = DicomModel::default();
/// model.set_backing_store(executor);
///
/// let root = ModelIndex::root();
/// assert_eq!(model.row_count(&root), 1);
/// let patient = model.index(0, Field::Name.column(), &root).unwrap();
/// assert_eq!(model.value(&patient).unwrap().to_string(), "Doe^Jane");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DicomModel {
    config: ModelConfig,
    tree: RefCell<Tree>,
    headers: RefCell<Vec<String>>,
    observers: RefCell<Vec<Rc<dyn ModelObserver>>>,
}

impl Default for DicomModel {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl DicomModel {
    /// Creates a model with no backing store.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            tree: RefCell::new(Tree::new()),
            headers: RefCell::new(Field::ALL.iter().map(|f| f.label().to_string()).collect()),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&self, observer: Rc<dyn ModelObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    /// Borrows the node cache for inspection.
    ///
    /// The borrow must be released before calling back into the model.
    pub fn tree(&self) -> Ref<'_, Tree> {
        self.tree.borrow()
    }

    /// Returns `true` once a backing store with tables is attached.
    pub fn has_root(&self) -> bool {
        self.tree.borrow().root().is_some()
    }

    // =========================================================================
    // Backing store
    // =========================================================================

    /// Discards the cached tree and attaches a new backing store.
    ///
    /// The root is recreated and its first page fetched. If the executor can
    /// report result sizes, the root's row count is seeded from its cursor
    /// instead and no scan takes place. A store without tables leaves the
    /// model empty.
    ///
    /// Previously handed-out indexes are invalid afterwards.
    pub fn set_backing_store(&self, executor: impl Executor + 'static) {
        self.notify(|o| o.model_about_to_be_reset(self));

        let has_tables = executor.has_tables();
        let supports_size = executor.supports_size();
        let root = {
            let mut tree = self.tree.borrow_mut();
            tree.attach(Box::new(executor));
            has_tables.then(|| tree.create_root())
        };

        self.notify(|o| o.model_reset(self));

        let Some(root) = root else {
            log::warn!("backing store has no tables, model left empty");
            return;
        };

        if supports_size {
            let size = self
                .tree
                .borrow()
                .node(root)
                .and_then(|n| n.cursor())
                .and_then(|c| c.size());
            if let Some(size) = size.filter(|&size| size > 0) {
                self.seed(root, size);
            }
        }

        self.fetch_node(root, self.config.page_size);
    }

    /// Marks `id` as holding exactly `size` rows, bracketed as an insertion.
    fn seed(&self, id: NodeId, size: usize) {
        let parent = self.index_of(id);
        self.notify(|o| o.rows_about_to_be_inserted(self, &parent, 0, size - 1));
        if let Some(node) = self.tree.borrow_mut().node_mut(id) {
            node.row_count = size;
            node.state = FetchState::Settled;
        }
        self.notify(|o| o.rows_inserted(self, &parent, 0, size - 1));
        log::debug!("seeded {:?} with {} rows from cursor size", id, size);
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Resolves the position at `row`/`column` under `parent`, creating and
    /// caching it on first use.
    ///
    /// Creating a position reads its key from the parent's row, which may
    /// fetch more of the parent's rows. Returns `None` for columns outside
    /// the model, for children of leaves, and when no store is attached.
    pub fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> Option<ModelIndex> {
        if column >= Field::COUNT {
            return None;
        }
        let parent_id = self.node_id(parent)?;

        {
            let tree = self.tree.borrow();
            if let Some(id) = tree.find_child(parent_id, row, column) {
                return Some(ModelIndex::new(row, column, id));
            }
            if tree.node(parent_id)?.level().is_leaf() {
                return None;
            }
        }

        let key = self
            .read(parent_id, row, KEY_FIELD)
            .map(|v| v.to_key_string())
            .unwrap_or_default();
        if key.is_empty() {
            log::debug!("row {} under {:?} has no key", row, parent_id);
        }

        let id = self
            .tree
            .borrow_mut()
            .create_child(parent_id, row, column, key)?;
        Some(ModelIndex::new(row, column, id))
    }

    /// Returns the parent of `index`, or the root position for top-level
    /// positions and the root itself.
    pub fn parent(&self, index: &ModelIndex) -> ModelIndex {
        let parent = index
            .node()
            .and_then(|id| self.tree.borrow().node(id).and_then(|n| n.parent()));
        parent.map(|id| self.index_of(id)).unwrap_or_default()
    }

    /// Number of rows known under `parent`.
    ///
    /// A node settled with no rows is given one more page fetch first; the
    /// fetch applies its usual guards.
    pub fn row_count(&self, parent: &ModelIndex) -> usize {
        let Some(id) = self.node_id(parent) else {
            return 0;
        };
        let retry = self
            .tree
            .borrow()
            .node(id)
            .is_some_and(|n| n.row_count() == 0 && n.is_settled());
        if retry {
            self.fetch_node(id, self.config.page_size);
        }
        self.tree.borrow().node(id).map_or(0, |n| n.row_count())
    }

    /// Number of columns, the same for every position.
    pub fn column_count(&self, _parent: &ModelIndex) -> usize {
        Field::COUNT
    }

    /// Returns `true` if `parent` has known rows, or may have some.
    pub fn has_children(&self, parent: &ModelIndex) -> bool {
        let Some(id) = self.node_id(parent) else {
            return false;
        };
        let mut tree = self.tree.borrow_mut();
        let Some(node) = tree.node_mut(id) else {
            return false;
        };
        if node.row_count() > 0 {
            return true;
        }
        !node.is_settled() && node.cursor_mut().is_some_and(|c| c.seek(0))
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Reads the value shown at `index`.
    ///
    /// Equivalent to [`field_value`](Self::field_value) with the field of the
    /// index's column.
    pub fn value(&self, index: &ModelIndex) -> Option<Value> {
        self.field_value(index, Field::from_column(index.column())?)
    }

    /// Reads `field` of the row shown at `index`.
    ///
    /// The row belongs to the parent's result set, so this reads the parent's
    /// cursor, fetching further if the row is not known yet. Returns `None`
    /// if the level does not project `field` or the row cannot be read.
    pub fn field_value(&self, index: &ModelIndex, field: Field) -> Option<Value> {
        if index.is_root() {
            return None;
        }
        let parent = self.parent(index);
        let parent_id = self.node_id(&parent)?;
        self.read(parent_id, index.row(), field.label())
    }

    /// Returns header data: the label for horizontal headers, the section
    /// number for vertical ones.
    pub fn header_value(&self, section: usize, orientation: Orientation) -> Option<Value> {
        match orientation {
            Orientation::Vertical => Some(Value::Integer(section as i64)),
            Orientation::Horizontal => self.headers.borrow().get(section).cloned().map(Value::Text),
        }
    }

    /// Replaces a horizontal header label.
    ///
    /// Labels are display text only; values keep resolving through the
    /// canonical field of each column. Returns `false` if nothing changed.
    pub fn set_header_value(
        &self,
        section: usize,
        orientation: Orientation,
        label: impl Into<String>,
    ) -> bool {
        if orientation == Orientation::Vertical {
            return false;
        }
        let label = label.into();
        {
            let mut headers = self.headers.borrow_mut();
            let Some(current) = headers.get_mut(section) else {
                return false;
            };
            if *current == label {
                return false;
            }
            *current = label;
        }
        self.notify(|o| o.header_data_changed(self, orientation, section, section));
        true
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Returns `true` until the exact row count under `parent` is known.
    pub fn can_fetch_more(&self, parent: &ModelIndex) -> bool {
        let Some(id) = self.node_id(parent) else {
            return false;
        };
        self.tree.borrow().node(id).is_some_and(|n| !n.is_settled())
    }

    /// Asks for one more page of rows under `parent`.
    pub fn fetch_more(&self, parent: &ModelIndex) -> FetchOutcome {
        let Some(id) = self.node_id(parent) else {
            return FetchOutcome::Skipped(fetch::SkipReason::Missing);
        };
        let known = self.tree.borrow().node(id).map_or(0, |n| n.row_count());
        self.fetch_node(id, known.saturating_add(self.config.page_size))
    }

    /// Grows the rows known under `parent` toward `limit`.
    pub fn fetch(&self, parent: &ModelIndex, limit: usize) -> FetchOutcome {
        match self.node_id(parent) {
            Some(id) => self.fetch_node(id, limit),
            None => FetchOutcome::Skipped(fetch::SkipReason::Missing),
        }
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Orders every level by `field` and regenerates every cached cursor.
    ///
    /// Known row counts and settled flags are kept as they were; they are
    /// reconciled by the next fetch on each node.
    pub fn sort(&self, field: Field, direction: Direction) {
        self.notify(|o| o.layout_about_to_be_changed(self));
        {
            let mut tree = self.tree.borrow_mut();
            tree.set_sort(Some(SortOrder::new(field, direction)));
            if let Some(root) = tree.root() {
                tree.regenerate(root);
            }
        }
        self.notify(|o| o.layout_changed(self));
    }

    /// Returns the active sort order.
    pub fn sort_order(&self) -> Option<SortOrder> {
        self.tree.borrow().sort()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn node_id(&self, index: &ModelIndex) -> Option<NodeId> {
        index.node().or_else(|| self.tree.borrow().root())
    }

    fn index_of(&self, id: NodeId) -> ModelIndex {
        let tree = self.tree.borrow();
        if tree.root() == Some(id) {
            return ModelIndex::root();
        }
        tree.node(id)
            .map(|n| ModelIndex::new(n.row(), n.column(), id))
            .unwrap_or_default()
    }

    fn fetch_node(&self, id: NodeId, limit: usize) -> FetchOutcome {
        let insertions = Insertions {
            model: self,
            parent: self.index_of(id),
        };
        fetch::fetch(&self.tree, id, limit, &insertions)
    }

    /// Reads column `name` of `row` in node `id`'s result set.
    fn read(&self, id: NodeId, row: usize, name: &str) -> Option<Value> {
        let known = self.tree.borrow().node(id)?.row_count();
        if row >= known {
            self.fetch_node(id, row.saturating_add(self.config.page_size));
        }

        let mut tree = self.tree.borrow_mut();
        let cursor = tree.node_mut(id)?.cursor_mut()?;
        let column = cursor.column_index(name)?;
        if !cursor.seek(row) {
            log::debug!("row {} of {:?} is not available", row, id);
            return None;
        }
        cursor.value(column)
    }

    fn notify(&self, f: impl Fn(&dyn ModelObserver)) {
        let observers = self.observers.borrow().clone();
        for observer in &observers {
            f(observer.as_ref());
        }
    }
}

/// Routes a fetch's insertion bracket to the model's observers.
struct Insertions<'a> {
    model: &'a DicomModel,
    parent: ModelIndex,
}

impl InsertionNotifier for Insertions<'_> {
    fn begin_insert(&self, first: usize, last: usize) {
        self.model
            .notify(|o| o.rows_about_to_be_inserted(self.model, &self.parent, first, last));
    }

    fn end_insert(&self, first: usize, last: usize) {
        self.model
            .notify(|o| o.rows_inserted(self.model, &self.parent, first, last));
    }
}
