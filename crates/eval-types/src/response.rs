use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::active_set::ActiveSet;

/// Values, gradients, and Hessians dimensioned by the owning active set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub values: Vec<f64>,
    pub gradients: Vec<Vec<f64>>,
    pub hessians: Vec<Vec<Vec<f64>>>,
}

impl ResponseData {
    pub fn new(values: Vec<f64>, gradients: Vec<Vec<f64>>, hessians: Vec<Vec<Vec<f64>>>) -> Self {
        Self {
            values,
            gradients,
            hessians,
        }
    }

    /// All-zero response of the given shape, used by recover() to fill
    /// gradients/Hessians when only a constant value vector is supplied.
    pub fn zeroed(num_responses: usize, num_vars: usize, active_set: &ActiveSet) -> Self {
        let values = vec![0.0; num_responses];
        let gradients = (0..num_responses)
            .map(|i| {
                if active_set.wants_gradient(i) {
                    vec![0.0; num_vars]
                } else {
                    Vec::new()
                }
            })
            .collect();
        let hessians = (0..num_responses)
            .map(|i| {
                if active_set.wants_hessian(i) {
                    vec![vec![0.0; num_vars]; num_vars]
                } else {
                    Vec::new()
                }
            })
            .collect();
        Self {
            values,
            gradients,
            hessians,
        }
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Owning(Arc<Mutex<ResponseData>>),
    View(Arc<Mutex<ResponseData>>),
}

impl Storage {
    fn handle(&self) -> &Arc<Mutex<ResponseData>> {
        match self {
            Storage::Owning(h) | Storage::View(h) => h,
        }
    }
}

/// A response created in one of two modes: *owning* (allocates its own
/// storage) or *view* (shares storage with another response for shallow
/// updates — writes through one are visible through the other).
#[derive(Debug, Clone)]
pub struct Response {
    storage: Storage,
    pub active_set: ActiveSet,
}

impl Response {
    pub fn new_owning(active_set: ActiveSet, data: ResponseData) -> Self {
        Self {
            storage: Storage::Owning(Arc::new(Mutex::new(data))),
            active_set,
        }
    }

    /// Creates a view over `source`'s storage. The view's active set may
    /// differ (e.g. a subset request); the underlying data is shared.
    pub fn new_view(active_set: ActiveSet, source: &Response) -> Self {
        Self {
            storage: Storage::View(Arc::clone(source.storage.handle())),
            active_set,
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self.storage, Storage::View(_))
    }

    /// Reads out a clone of the current response data. Called after the
    /// single mutation per evaluation (or per retry attempt) has landed.
    pub fn get(&self) -> ResponseData {
        self.storage.handle().lock().unwrap().clone()
    }

    /// Mutates the shared storage. A view and its source observe the same
    /// write immediately.
    pub fn set(&self, data: ResponseData) {
        *self.storage.handle().lock().unwrap() = data;
    }
}
