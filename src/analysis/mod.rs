/// Analysis layer: turns warehoused readings into prediction inputs.

pub mod features;
