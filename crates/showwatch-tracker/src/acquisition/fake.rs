//! Scripted in-process browser for tests.

use std::{
  collections::{HashMap, VecDeque},
  sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::driver::{DriverError, DriverFactory, PageDriver};

/// What the fake site serves for one requested URL.
#[derive(Clone)]
pub struct FakePage {
  pub final_url: String,
  pub document:  String,
}

#[derive(Default)]
pub struct FakeState {
  pub pages:            HashMap<String, FakePage>,
  /// Upcoming navigation outcomes; `true` fails. Empty means succeed.
  pub navigate_script:  VecDeque<bool>,
  /// When set, the liveness check fails on every existing session.
  pub liveness_fails:   bool,
  pub grid_present:     bool,
  pub sessions_created: usize,
  pub sessions_quit:    usize,
  pub navigations:      Vec<String>,
  current:              Option<FakePage>,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
  pub state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
  pub fn new() -> Self {
    let browser = Self::default();
    browser.state.lock().unwrap().grid_present = true;
    browser
  }

  pub fn serve(&self, url: &str, final_url: &str, document: &str) {
    self.state.lock().unwrap().pages.insert(url.to_owned(), FakePage {
      final_url: final_url.to_owned(),
      document:  document.to_owned(),
    });
  }

  pub fn fail_next_navigations(&self, outcomes: &[bool]) {
    self.state.lock().unwrap().navigate_script.extend(outcomes.iter().copied());
  }

  pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R { f(&mut self.state.lock().unwrap()) }
}

struct FakeSession {
  state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl DriverFactory for FakeBrowser {
  async fn create(&self) -> Result<Box<dyn PageDriver>, DriverError> {
    let mut state = self.state.lock().unwrap();
    state.sessions_created += 1;
    state.liveness_fails = false;
    Ok(Box::new(FakeSession { state: self.state.clone() }))
  }
}

#[async_trait]
impl PageDriver for FakeSession {
  async fn navigate(&self, url: &str) -> Result<(), DriverError> {
    let mut state = self.state.lock().unwrap();
    state.navigations.push(url.to_owned());
    if state.navigate_script.pop_front().unwrap_or(false) {
      return Err(DriverError::Remote {
        error:   "unknown error".into(),
        message: "net::ERR_CONNECTION_RESET".into(),
      });
    }
    let page = state.pages.get(url).cloned().unwrap_or_else(|| FakePage {
      final_url: url.to_owned(),
      document:  String::new(),
    });
    state.current = Some(page);
    Ok(())
  }

  async fn current_url(&self) -> Result<String, DriverError> {
    let state = self.state.lock().unwrap();
    if state.liveness_fails {
      return Err(DriverError::SessionGone);
    }
    Ok(state.current.as_ref().map_or_else(|| "about:blank".into(), |p| p.final_url.clone()))
  }

  async fn page_source(&self) -> Result<String, DriverError> {
    let state = self.state.lock().unwrap();
    Ok(state.current.as_ref().map(|p| p.document.clone()).unwrap_or_default())
  }

  async fn element_exists(&self, _selector: &str) -> Result<bool, DriverError> {
    Ok(self.state.lock().unwrap().grid_present)
  }

  async fn quit(&self) -> Result<(), DriverError> {
    self.state.lock().unwrap().sessions_quit += 1;
    Ok(())
  }
}

/// A minimal rendered listing page with one card per `(title, times)`.
pub fn listing_html(movies: &[(&str, &[&str])]) -> String {
  let cells: String = movies
    .iter()
    .map(|(title, times)| {
      let slots: String = times
        .iter()
        .map(|t| format!(r#"<div class="sc-1skzbbo-0"><span class="sc-yr56qh-1">{t}</span></div>"#))
        .collect();
      format!(
        r#"<div role="gridcell"><div class="sc-1412vr2-0"><a class="sc-1412vr2-2" href="/movies/x/ET1">{title}</a><div class="sc-19dkgz1-0">{slots}</div></div></div>"#
      )
    })
    .collect();
  format!(r#"<html><body><div class="ReactVirtualized__Grid__innerScrollContainer">{cells}</div></body></html>"#)
}
