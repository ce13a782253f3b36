//! Process-wide shared state: the global variable map, function table,
//! directory stack, and the registry of outstanding async tasks.
//!
//! The distilled spec leaves concurrent access to this state an open
//! question ("assumed racy unless guarded"). This implementation resolves
//! it conservatively: each piece of shared state lives behind its own
//! `Mutex`, and `Runtime` itself is always held as an `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::ast::FunctionDef;

pub const RESERVED_IDENTS: &[&str] = &["status", "pid", "ppid", "cdstack", "args"];

pub type Scope = HashMap<String, Vec<String>>;

pub struct Runtime {
    pub global_vars: Mutex<Scope>,
    pub functions: Mutex<HashMap<String, FunctionDef>>,
    pub dir_stack: Mutex<Vec<String>>,
    pub async_tasks: Mutex<HashMap<u64, AsyncTask>>,
    next_task_id: AtomicU64,
    pub interactive: bool,
}

pub struct AsyncTask {
    pub handle: JoinHandle<()>,
}

impl Runtime {
    pub fn new(interactive: bool) -> Self {
        let pid = std::process::id().to_string();
        let ppid = unsafe { libc::getppid() }.to_string();
        let mut vars = HashMap::new();
        vars.insert("status".to_string(), vec!["0".to_string()]);
        vars.insert("pid".to_string(), vec![pid]);
        vars.insert("ppid".to_string(), vec![ppid]);
        vars.insert("cdstack".to_string(), Vec::new());

        Runtime {
            global_vars: Mutex::new(vars),
            functions: Mutex::new(HashMap::new()),
            dir_stack: Mutex::new(Vec::new()),
            async_tasks: Mutex::new(HashMap::new()),
            next_task_id: AtomicU64::new(1),
            interactive,
        }
    }

    pub fn set_status(&self, exit: u8) {
        self.global_vars
            .lock()
            .unwrap()
            .insert("status".to_string(), vec![exit.to_string()]);
    }

    pub fn sync_cdstack(&self) {
        let stack = self.dir_stack.lock().unwrap().clone();
        self.global_vars.lock().unwrap().insert("cdstack".to_string(), stack);
    }

    pub fn register_task(&self, handle: JoinHandle<()>) -> u64 {
        let id = self.next_task_id.fetch_add(1, Ordering::SeqCst);
        self.async_tasks.lock().unwrap().insert(id, AsyncTask { handle });
        id
    }

    pub fn take_task(&self, id: u64) -> Option<AsyncTask> {
        self.async_tasks.lock().unwrap().remove(&id)
    }

    pub fn all_task_ids(&self) -> Vec<u64> {
        self.async_tasks.lock().unwrap().keys().copied().collect()
    }
}
