//! Task name to scheduling model mapping.
//!
//! The registry is the static task model of the firmware under analysis: for
//! each task name, its period class and configured priority. It is built once
//! from a catalog and never changes afterwards.

use std::{collections::HashMap, fmt::Display, fs::File, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// Catalog of the FreeRTOS full demo shipped with the pico firmware.
const BUILTIN_CATALOG: &str = include_str!("../tasks/freertos_full_demo.json");

/// Scheduling discipline of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "class")]
pub enum PeriodClass {
    /// Released once every `period_us` microseconds. Never zero.
    Periodic { period_us: u64 },
    /// Always ready (idle task, busy demo tasks).
    NonStop,
    /// Released on demand only.
    Aperiodic,
}

impl PeriodClass {
    pub fn period_us(&self) -> Option<u64> {
        match self {
            PeriodClass::Periodic { period_us } => Some(*period_us),
            _ => None,
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, PeriodClass::Periodic { .. })
    }
}

impl Display for PeriodClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodClass::Periodic { period_us } => write!(f, "{}", period_us),
            PeriodClass::NonStop => f.write_str("non-stop"),
            PeriodClass::Aperiodic => f.write_str("aperiodic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub name: String,
    pub period: PeriodClass,
    pub priority: u32,
}

impl TaskDescriptor {
    pub fn new(name: &str, period: PeriodClass, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            period,
            priority,
        }
    }

    pub fn periodic(name: &str, period_us: u64, priority: u32) -> Self {
        Self::new(name, PeriodClass::Periodic { period_us }, priority)
    }
}

/// Period as written in a catalog file: microseconds, a duration string
/// (`"12s"`, `"250ms"`), `"non_stop"` or `"aperiodic"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodSpec {
    Micros(u64),
    Text(String),
}

impl TryFrom<PeriodSpec> for PeriodClass {
    type Error = anyhow::Error;

    fn try_from(spec: PeriodSpec) -> anyhow::Result<Self> {
        let period_us = match spec {
            PeriodSpec::Micros(us) => us,
            PeriodSpec::Text(s) => match s.trim() {
                "non_stop" | "nonstop" | "non-stop" => return Ok(PeriodClass::NonStop),
                "aperiodic" => return Ok(PeriodClass::Aperiodic),
                text => {
                    let d = duration_str::parse(text)
                        .map_err(|e| anyhow::anyhow!("invalid period {:?}: {}", text, e))?;
                    u64::try_from(d.as_micros())?
                }
            },
        };

        Ok(PeriodClass::Periodic { period_us })
    }
}

#[derive(Deserialize)]
struct TaskSpec {
    name: String,
    period: PeriodSpec,
    priority: u32,
}

#[derive(Deserialize)]
struct Catalog {
    tasks: Vec<TaskSpec>,
}

/// Immutable task catalog. Keeps the catalog order for listing.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Vec<TaskDescriptor>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Builds a registry, rejecting duplicate names and zero periods.
    pub fn new<I: IntoIterator<Item = TaskDescriptor>>(descriptors: I) -> Result<Self> {
        let mut tasks = Vec::new();
        let mut index = HashMap::new();

        for descriptor in descriptors {
            if descriptor.period.period_us() == Some(0) {
                return Err(StatError::InvalidPeriod(descriptor.name));
            }

            if index.contains_key(&descriptor.name) {
                return Err(StatError::DuplicateTask(descriptor.name));
            }

            index.insert(descriptor.name.clone(), tasks.len());
            tasks.push(descriptor);
        }

        Ok(Self { tasks, index })
    }

    /// The FreeRTOS full demo catalog embedded in the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG).context("built-in task catalog")
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        Self::from_catalog(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open task catalog {}", path.display()))?;
        let catalog: Catalog = serde_json::from_reader(file)
            .with_context(|| format!("invalid task catalog {}", path.display()))?;

        Self::from_catalog(catalog).with_context(|| format!("task catalog {}", path.display()))
    }

    fn from_catalog(catalog: Catalog) -> anyhow::Result<Self> {
        let mut descriptors = Vec::with_capacity(catalog.tasks.len());

        for spec in catalog.tasks {
            let period = PeriodClass::try_from(spec.period)
                .with_context(|| format!("task '{}'", spec.name))?;
            descriptors.push(TaskDescriptor {
                name: spec.name,
                period,
                priority: spec.priority,
            });
        }

        Ok(Self::new(descriptors)?)
    }

    pub fn lookup(&self, name: &str) -> Result<&TaskDescriptor> {
        self.index
            .get(name)
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| StatError::UnknownTask(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
