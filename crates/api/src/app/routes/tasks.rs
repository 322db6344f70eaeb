use axum::Json;

use crate::app::dto::TaskResponse;

const DEMO_TASKS: [TaskResponse; 3] = [
    TaskResponse { id: "1", task: "Finish report", status: "Pending" },
    TaskResponse { id: "2", task: "Email the customer", status: "Done" },
    TaskResponse { id: "3", task: "Update the system", status: "In progress" },
];

/// GET /protected/tasks - static demo list
pub async fn list_tasks() -> Json<[TaskResponse; 3]> {
    Json(DEMO_TASKS)
}
