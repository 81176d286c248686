//! Shared database handle with an explicit open/close lifecycle.

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

use crate::data::jobs::GenerateJob;
use crate::data::models::{
    Activity, Course, Group, Institution, Room, Schedule, ScheduledActivity, User,
};

/// Clone-able handle over the MongoDB client and the service database.
///
/// One context is created at startup and torn down with [`DbContext::close`]
/// on shutdown; no other process-wide storage state exists.
#[derive(Clone, Debug)]
pub struct DbContext {
    client: Client,
    db: Database,
}

impl DbContext {
    pub async fn connect(uri: &str, db_name: &str) -> mongodb::error::Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    /// Round-trips a `ping` command to verify the deployment is reachable.
    pub async fn ping(&self) -> mongodb::error::Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub fn institutions(&self) -> Collection<Institution> {
        self.db.collection("institutions")
    }

    pub fn rooms(&self) -> Collection<Room> {
        self.db.collection("rooms")
    }

    pub fn groups(&self) -> Collection<Group> {
        self.db.collection("groups")
    }

    pub fn courses(&self) -> Collection<Course> {
        self.db.collection("courses")
    }

    pub fn activities(&self) -> Collection<Activity> {
        self.db.collection("activities")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn schedules(&self) -> Collection<Schedule> {
        self.db.collection("schedules")
    }

    pub fn scheduled_activities(&self) -> Collection<ScheduledActivity> {
        self.db.collection("scheduled_activities")
    }

    pub fn schedule_jobs(&self) -> Collection<GenerateJob> {
        self.db.collection("schedule_jobs")
    }

    /// Creates the secondary indexes the query paths rely on. Safe to run on
    /// every startup; index creation is idempotent.
    pub async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        let index_on = |keys| IndexModel::builder().keys(keys).build();

        self.rooms()
            .create_index(index_on(doc! { "institution_id": 1 }))
            .await?;
        self.groups()
            .create_index(index_on(doc! { "institution_id": 1 }))
            .await?;
        self.courses()
            .create_index(index_on(doc! { "institution_id": 1 }))
            .await?;
        self.activities()
            .create_index(index_on(doc! { "institution_id": 1 }))
            .await?;
        self.activities()
            .create_index(index_on(doc! { "professor_id": 1 }))
            .await?;
        self.schedules()
            .create_index(index_on(doc! { "institution_id": 1 }))
            .await?;
        self.scheduled_activities()
            .create_index(index_on(doc! { "schedule_id": 1 }))
            .await?;
        self.schedule_jobs()
            .create_index(index_on(doc! { "locked_at": 1, "queued_at": 1 }))
            .await?;

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        info!("storage indexes ensured");
        Ok(())
    }

    /// Tears down the client's connection pool. Call once on shutdown.
    pub async fn close(self) {
        drop(self.db);
        self.client.shutdown().await;
        info!("storage client shut down");
    }
}
