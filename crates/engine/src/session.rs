// Single-threaded async driver for a GridEngine.
//
// Drains the engine's outbox onto a smol LocalExecutor: store calls,
// clipboard reads and the debounce timer all run as local tasks and feed
// their results back into the engine on the same thread.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

use gridbase_config::GridSettings;
use gridbase_core::TableId;
use smol::LocalExecutor;

use crate::grid::{Effect, GridEngine};
use crate::input::InputEvent;
use crate::store::{RowStore, StoreError};

/// Access to the system clipboard.
pub trait ClipboardPort {
    fn write_text(&self, text: &str);
    /// `None` when the clipboard is empty or access was denied.
    fn read_text(&self) -> Pin<Box<dyn Future<Output = Option<String>>>>;
}

/// Process-local clipboard for headless use and tests.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    text: Rc<RefCell<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    pub fn set_contents(&self, text: Option<String>) {
        *self.text.borrow_mut() = text;
    }
}

impl ClipboardPort for MemoryClipboard {
    fn write_text(&self, text: &str) {
        *self.text.borrow_mut() = Some(text.to_string());
    }

    fn read_text(&self) -> Pin<Box<dyn Future<Output = Option<String>>>> {
        Box::pin(std::future::ready(self.contents()))
    }
}

pub struct GridSession<S: RowStore + 'static> {
    engine: Rc<RefCell<GridEngine>>,
    store: Rc<S>,
    clipboard: Rc<dyn ClipboardPort>,
    executor: Rc<LocalExecutor<'static>>,
    /// Spawned tasks that have not finished yet.
    in_flight: Rc<Cell<usize>>,
    /// Deadline the debounce timer is armed for.
    timer: Rc<Cell<Option<Instant>>>,
}

impl<S: RowStore + 'static> GridSession<S> {
    /// Load the table's columns, row count and primary rows, then wrap an
    /// engine around them.
    pub async fn open(
        store: S,
        table: TableId,
        settings: GridSettings,
        clipboard: Rc<dyn ClipboardPort>,
    ) -> Result<Self, StoreError> {
        let columns = store.list_columns(&table).await?;
        let total = store.count_rows(&table).await?;
        let primary = store.fetch_rows(&table, 0, settings.primary_rows).await?;
        log::debug!("opened {} ({} rows, {} columns)", table, total, columns.len());

        let mut engine = GridEngine::new(table, settings);
        engine.load(columns, total, primary.items);
        Ok(Self::from_engine(engine, store, clipboard))
    }

    /// Drive an already loaded engine.
    pub fn from_engine(engine: GridEngine, store: S, clipboard: Rc<dyn ClipboardPort>) -> Self {
        Self {
            engine: Rc::new(RefCell::new(engine)),
            store: Rc::new(store),
            clipboard,
            executor: Rc::new(LocalExecutor::new()),
            in_flight: Rc::new(Cell::new(0)),
            timer: Rc::new(Cell::new(None)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` against the engine, then start whatever work it queued.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut GridEngine) -> R) -> R {
        let result = f(&mut self.engine.borrow_mut());
        self.pump();
        result
    }

    pub fn handle_input(&self, event: InputEvent) -> bool {
        self.with_engine(|engine| engine.handle_input(event))
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.get() == 0 && !self.engine.borrow().has_effects()
    }

    /// Start every effect in the engine's outbox and arm the debounce
    /// timer for the earliest queued write.
    pub fn pump(&self) {
        let effects = self.engine.borrow_mut().take_effects();
        for effect in effects {
            self.start(effect);
        }
        self.arm_timer();
    }

    fn start(&self, effect: Effect) {
        match effect {
            Effect::Fetch(request) => {
                let table = self.engine.borrow().table().clone();
                let fetch = self.store.fetch_rows(&table, request.offset, request.limit);
                let engine = Rc::clone(&self.engine);
                self.spawn(async move {
                    let result = fetch.await;
                    engine.borrow_mut().complete_fetch(request.key, result);
                });
            }
            Effect::Mutate { id, mutation } => {
                let table = self.engine.borrow().table().clone();
                let send = mutation.send(&*self.store, &table);
                let engine = Rc::clone(&self.engine);
                self.spawn(async move {
                    let result = send.await;
                    engine.borrow_mut().complete_mutation(id, result);
                });
            }
            Effect::WriteClipboard(text) => self.clipboard.write_text(&text),
            Effect::ReadClipboard => {
                let read = self.clipboard.read_text();
                let engine = Rc::clone(&self.engine);
                self.spawn(async move {
                    let text = read.await;
                    engine.borrow_mut().handle_input(InputEvent::ClipboardText(text));
                });
            }
        }
    }

    fn arm_timer(&self) {
        let Some(deadline) = self.engine.borrow().next_flush_deadline() else {
            return;
        };
        if self.timer.get().is_some_and(|armed| armed <= deadline) {
            return;
        }
        self.timer.set(Some(deadline));

        let engine = Rc::clone(&self.engine);
        let timer = Rc::clone(&self.timer);
        self.spawn(async move {
            smol::Timer::at(deadline).await;
            // A newer, earlier timer may have replaced this one.
            if timer.get() == Some(deadline) {
                timer.set(None);
            }
            engine.borrow_mut().release_due(deadline);
        });
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        let in_flight = Rc::clone(&self.in_flight);
        in_flight.set(in_flight.get() + 1);
        self.executor
            .spawn(async move {
                task.await;
                in_flight.set(in_flight.get() - 1);
            })
            .detach();
    }

    /// Run until no task is pending and the outbox is empty. Queued
    /// writes wait for their debounce deadline first.
    pub async fn run_until_idle(&self) {
        loop {
            self.pump();
            if self.executor.try_tick() {
                continue;
            }
            if self.in_flight.get() == 0 {
                if self.engine.borrow().has_effects() {
                    continue;
                }
                break;
            }
            self.executor.tick().await;
        }
    }
}
