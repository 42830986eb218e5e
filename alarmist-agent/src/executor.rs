//! Runs generated commands against an alarm store

use alarmist_core::alarm::{Alarm, AlarmStore, Command, Operation};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What a command did to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub operation: Operation,
    /// Alarms created, updated, deleted or returned
    pub affected: usize,
    /// Created alarm or query results
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alarms: Vec<Alarm>,
}

/// Execute `command` against `store`
pub async fn execute(
    store: &dyn AlarmStore,
    command: &Command,
) -> alarmist_core::Result<ExecutionReport> {
    let report = match command.operation {
        Operation::Create => {
            let alarm = store.create(&command.payload).await?;
            ExecutionReport {
                operation: Operation::Create,
                affected: 1,
                alarms: vec![alarm],
            }
        }
        Operation::Update => {
            let affected = store.update(&command.selector, &command.payload).await?;
            ExecutionReport {
                operation: Operation::Update,
                affected,
                alarms: Vec::new(),
            }
        }
        Operation::Delete => {
            let affected = store.delete(&command.selector).await?;
            ExecutionReport {
                operation: Operation::Delete,
                affected,
                alarms: Vec::new(),
            }
        }
        Operation::Query => {
            let alarms = store.query(&command.selector, &command.order_by).await?;
            ExecutionReport {
                operation: Operation::Query,
                affected: alarms.len(),
                alarms,
            }
        }
    };

    info!(
        "Executed {} affecting {} alarm(s)",
        report.operation, report.affected
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarmist_core::alarm::{AlarmService, Field, FieldValue, Selector};

    fn create(label: &str, time: &str) -> Command {
        let mut command = Command::new(Operation::Create);
        command.payload.insert(Field::Label, FieldValue::text(label));
        command.payload.insert(Field::Time, FieldValue::text(time));
        command
    }

    #[tokio::test]
    async fn test_create_query_delete() {
        let store = AlarmService::in_memory();

        let report = execute(&store, &create("gym", "7:00 AM")).await.unwrap();
        assert_eq!(report.affected, 1);
        assert_eq!(report.alarms[0].label, "gym");

        execute(&store, &create("work", "8:00 AM")).await.unwrap();

        let mut query = Command::new(Operation::Query);
        query.order_by = vec![Field::Date, Field::Time];
        let report = execute(&store, &query).await.unwrap();
        assert_eq!(report.affected, 2);

        let mut delete = Command::new(Operation::Delete);
        delete.selector = Selector::by_label("GYM");
        let report = execute(&store, &delete).await.unwrap();
        assert_eq!(report.affected, 1);
    }

    #[tokio::test]
    async fn test_update_reports_count() {
        let store = AlarmService::in_memory();
        execute(&store, &create("gym", "7:00 AM")).await.unwrap();

        let mut update = Command::new(Operation::Update);
        update.selector = Selector::by_label("yoga");
        update.payload.insert(Field::Time, FieldValue::text("9:00 AM"));
        let report = execute(&store, &update).await.unwrap();
        assert_eq!(report.affected, 0);
    }

    #[test]
    fn test_query_on_empty_store() {
        let store = AlarmService::in_memory();
        let report =
            tokio_test::block_on(execute(&store, &Command::new(Operation::Query))).unwrap();
        assert_eq!(report.affected, 0);
        assert!(report.alarms.is_empty());
    }
}
