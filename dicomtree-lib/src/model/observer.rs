//! Change notifications for presentation layers

use super::DicomModel;
use super::ModelIndex;
use super::Orientation;

/// Receives change notifications from a [`DicomModel`].
///
/// Every method has an empty default body. The model is passed back to each
/// callback and holds no internal borrow while notifying, so an observer may
/// query (or even drive) the model from inside a notification. Fetches
/// requested on a node that is already fetching are rejected.
///
/// Insertions are bracketed: `rows_about_to_be_inserted` is delivered while
/// the node still reports its old row count, `rows_inserted` after the new
/// count is stored.
pub trait ModelObserver {
    /// Rows `first..=last` are about to appear under `parent`.
    fn rows_about_to_be_inserted(
        &self,
        _model: &DicomModel,
        _parent: &ModelIndex,
        _first: usize,
        _last: usize,
    ) {
    }

    /// Rows `first..=last` have appeared under `parent`.
    fn rows_inserted(&self, _model: &DicomModel, _parent: &ModelIndex, _first: usize, _last: usize) {}

    /// Cursors are about to be regenerated (sort change).
    fn layout_about_to_be_changed(&self, _model: &DicomModel) {}

    /// Cursors have been regenerated.
    fn layout_changed(&self, _model: &DicomModel) {}

    /// The whole tree is about to be discarded.
    fn model_about_to_be_reset(&self, _model: &DicomModel) {}

    /// The tree has been rebuilt from an empty root.
    fn model_reset(&self, _model: &DicomModel) {}

    /// Header labels in `first..=last` changed.
    fn header_data_changed(
        &self,
        _model: &DicomModel,
        _orientation: Orientation,
        _first: usize,
        _last: usize,
    ) {
    }
}
