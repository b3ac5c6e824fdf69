//! Shared fixtures for the integration tests: a tracing stepper
//! driver, scripted receiver pins and an assembled device around a
//! RAM-backed store.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use focuser_core::motion::driver::{Direction, StepMode, StepperDriver};
use focuser_core::receiver::{Indicator, ReceiverPins};
use focuser_core::store::RamStore;
use focuser_core::Focuser;

#[derive(Default)]
pub struct DriverTrace {
    pub pulses: u32,
    pub last_direction: Option<Direction>,
    pub mode: Option<StepMode>,
}

pub struct SharedDriver(pub Rc<RefCell<DriverTrace>>);

impl StepperDriver for SharedDriver {
    fn set_direction(&mut self, direction: Direction) {
        self.0.borrow_mut().last_direction = Some(direction);
    }
    fn pulse(&mut self) {
        self.0.borrow_mut().pulses += 1;
    }
    fn set_step_mode(&mut self, mode: StepMode) {
        self.0.borrow_mut().mode = Some(mode);
    }
}

pub struct SharedPins(pub Rc<Cell<u8>>);

impl ReceiverPins for SharedPins {
    fn read(&self) -> u8 {
        self.0.get()
    }
}

pub struct SharedLed(pub Rc<Cell<bool>>);

impl Indicator for SharedLed {
    fn set(&mut self, on: bool) {
        self.0.set(on);
    }
}

pub type Device = Focuser<SharedDriver, RamStore, SharedPins, SharedLed>;

pub struct Fixture {
    pub trace: Rc<RefCell<DriverTrace>>,
    pub pins: Rc<Cell<u8>>,
    pub led: Rc<Cell<bool>>,
    pub dev: Device,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_store(RamStore::new())
    }

    pub fn with_store(store: RamStore) -> Self {
        let trace = Rc::new(RefCell::new(DriverTrace::default()));
        let pins = Rc::new(Cell::new(0));
        let led = Rc::new(Cell::new(false));
        let dev = Focuser::new(
            SharedDriver(Rc::clone(&trace)),
            store,
            SharedPins(Rc::clone(&pins)),
            SharedLed(Rc::clone(&led)),
        );
        Self {
            trace,
            pins,
            led,
            dev,
        }
    }

    pub fn run_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.dev.tick();
        }
    }

    pub fn pulses(&self) -> u32 {
        self.trace.borrow().pulses
    }
}
