use std::collections::{BTreeMap, HashMap};

/// A name → value lookup supplied by the caller at evaluation time.
pub trait Variables {
    fn get(&self, name: &str) -> Option<f64>;
}

impl Variables for HashMap<String, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl Variables for HashMap<&str, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl Variables for BTreeMap<String, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        BTreeMap::get(self, name).copied()
    }
}

impl Variables for [(&str, f64)] {
    fn get(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> Variables for [(&str, f64); N] {
    fn get(&self, name: &str) -> Option<f64> {
        Variables::get(self.as_slice(), name)
    }
}

impl Variables for () {
    fn get(&self, _name: &str) -> Option<f64> {
        None
    }
}

impl<V: Variables + ?Sized> Variables for &V {
    fn get(&self, name: &str) -> Option<f64> {
        (**self).get(name)
    }
}
