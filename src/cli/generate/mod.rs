//! Generate command - prints formatted keys without touching storage

use clap::{Args, ValueEnum};

use crate::domain::serial_key::KeyPlan;
use crate::infrastructure::serial_key::SerialKeyGenerator;

/// Plan accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanArg {
    /// 30-day key
    #[value(name = "m", alias = "monthly")]
    Monthly,
    /// 365-day key
    #[value(name = "y", alias = "yearly")]
    Yearly,
}

impl From<PlanArg> for KeyPlan {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Monthly => KeyPlan::Monthly,
            PlanArg::Yearly => KeyPlan::Yearly,
        }
    }
}

/// Arguments for the generate command
#[derive(Args, Clone)]
pub struct GenerateArgs {
    /// Plan of the key
    #[arg(long, value_enum, ignore_case = true)]
    pub plan: PlanArg,

    /// Number of keys to print
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

/// Print `count` keys for the requested plan, one per line
pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    for key in generate_keys(args.plan.into(), args.count) {
        println!("{}", key);
    }

    Ok(())
}

fn generate_keys(plan: KeyPlan, count: usize) -> Vec<String> {
    let generator = SerialKeyGenerator::new();
    (0..count).map(|_| generator.generate(plan).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::serial_key::is_valid_format;

    #[test]
    fn test_generate_keys() {
        let keys = generate_keys(KeyPlan::Yearly, 4);

        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| is_valid_format(k) && k.starts_with('Y')));
    }

    #[test]
    fn test_plan_arg_maps_to_key_plan() {
        assert_eq!(KeyPlan::from(PlanArg::Monthly), KeyPlan::Monthly);
        assert_eq!(KeyPlan::from(PlanArg::Yearly), KeyPlan::Yearly);
    }

    #[test]
    fn test_run_prints_keys() {
        let args = GenerateArgs {
            plan: PlanArg::Monthly,
            count: 2,
        };

        assert!(run(args).is_ok());
    }
}
