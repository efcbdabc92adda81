use opentelemetry::KeyValue;

pub trait Counter<T> {
    fn add(&self, value: T, attributes: &[KeyValue]);
}

pub trait Gauge<T> {
    fn record(&self, value: T, attributes: &[KeyValue]);
}

pub trait Histogram<T> {
    fn record(&self, value: T, attributes: &[KeyValue]);
}

#[derive(Clone)]
pub enum ProcessorCounter<T> {
    OTELCounter(opentelemetry::metrics::Counter<T>),
    NoOpCounter,
}

impl<T> Counter<T> for ProcessorCounter<T> {
    fn add(&self, value: T, attributes: &[KeyValue]) {
        match self {
            ProcessorCounter::OTELCounter(c) => c.add(value, attributes),
            ProcessorCounter::NoOpCounter => {}
        }
    }
}

#[derive(Clone)]
pub enum ProcessorGauge<T> {
    OTELGauge(opentelemetry::metrics::Gauge<T>),
    NoOpGauge,
}

impl<T> Gauge<T> for ProcessorGauge<T> {
    fn record(&self, value: T, attributes: &[KeyValue]) {
        match self {
            ProcessorGauge::OTELGauge(g) => g.record(value, attributes),
            ProcessorGauge::NoOpGauge => {}
        }
    }
}

#[derive(Clone)]
pub enum ProcessorHistogram<T> {
    OTELHistogram(opentelemetry::metrics::Histogram<T>),
    NoOpHistogram,
}

impl<T> Histogram<T> for ProcessorHistogram<T> {
    fn record(&self, value: T, attributes: &[KeyValue]) {
        match self {
            ProcessorHistogram::OTELHistogram(h) => h.record(value, attributes),
            ProcessorHistogram::NoOpHistogram => {}
        }
    }
}
