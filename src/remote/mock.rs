//! In-memory stand-in for the HTTP API, used across the store and state
//! tests. Reachability and failure modes are toggled with atomics so a
//! test can flip the server offline mid-scenario.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::recipe::types::{Recipe, RecipeDraft, RecipePatch};

use super::RemoteApi;

#[derive(Default)]
pub struct CallCounts {
  pub list: AtomicUsize,
  pub get: AtomicUsize,
  pub create: AtomicUsize,
  pub update: AtomicUsize,
  pub delete: AtomicUsize,
}

pub struct MockRemote {
  recipes: Mutex<Vec<Recipe>>,
  reachable: AtomicBool,
  fail_reads: AtomicBool,
  fail_writes: AtomicBool,
  next_id: AtomicUsize,
  pub calls: CallCounts,
}

impl MockRemote {
  pub fn new() -> Self {
    Self::with_recipes(Vec::new())
  }

  pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
    Self {
      recipes: Mutex::new(recipes),
      reachable: AtomicBool::new(true),
      fail_reads: AtomicBool::new(false),
      fail_writes: AtomicBool::new(false),
      next_id: AtomicUsize::new(1),
      calls: CallCounts::default(),
    }
  }

  pub fn offline() -> Self {
    let mock = Self::new();
    mock.set_reachable(false);
    mock
  }

  pub fn set_reachable(&self, reachable: bool) {
    self.reachable.store(reachable, Ordering::SeqCst);
  }

  pub fn set_fail_reads(&self, fail: bool) {
    self.fail_reads.store(fail, Ordering::SeqCst);
  }

  pub fn set_fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  pub fn recipes(&self) -> Vec<Recipe> {
    self.recipes.lock().unwrap().clone()
  }

  pub fn total_calls(&self) -> usize {
    self.calls.list.load(Ordering::SeqCst)
      + self.calls.get.load(Ordering::SeqCst)
      + self.calls.create.load(Ordering::SeqCst)
      + self.calls.update.load(Ordering::SeqCst)
      + self.calls.delete.load(Ordering::SeqCst)
  }

  fn read_gate(&self) -> Result<(), StoreError> {
    if !self.reachable.load(Ordering::SeqCst) || self.fail_reads.load(Ordering::SeqCst) {
      return Err(StoreError::Transient("mock server unreachable".into()));
    }
    Ok(())
  }

  fn write_gate(&self) -> Result<(), StoreError> {
    self.read_gate()?;
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StoreError::Transient("mock server refused write".into()));
    }
    Ok(())
  }
}

impl RemoteApi for MockRemote {
  async fn probe(&self) -> bool {
    self.reachable.load(Ordering::SeqCst)
  }

  async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
    self.calls.list.fetch_add(1, Ordering::SeqCst);
    self.read_gate()?;
    Ok(self.recipes.lock().unwrap().clone())
  }

  async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
    self.calls.get.fetch_add(1, Ordering::SeqCst);
    self.read_gate()?;
    Ok(self.recipes.lock().unwrap().iter().find(|r| r.id == id).cloned())
  }

  async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
    self.calls.create.fetch_add(1, Ordering::SeqCst);
    self.write_gate()?;
    let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
    let recipe = draft.clone().into_recipe(id, Utc::now());
    // Server lists newest first.
    self.recipes.lock().unwrap().insert(0, recipe.clone());
    Ok(recipe)
  }

  async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> Result<Recipe, StoreError> {
    self.calls.update.fetch_add(1, Ordering::SeqCst);
    self.write_gate()?;
    let mut recipes = self.recipes.lock().unwrap();
    let recipe = recipes
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    patch.apply_to(recipe);
    recipe.updated_at = Utc::now();
    Ok(recipe.clone())
  }

  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError> {
    self.calls.delete.fetch_add(1, Ordering::SeqCst);
    self.write_gate()?;
    self.recipes.lock().unwrap().retain(|r| r.id != id);
    Ok(())
  }
}
