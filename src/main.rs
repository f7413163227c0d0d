use std::sync::Arc;

use ontograph::{GraphStore, MemoryGraphStore, OntologyEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Run the demo against the embedded store; swap in a Cypher store over
    // a connected engine for a persistent backend.
    let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
    let engine = OntologyEngine::new(store);

    tracing::info!("Building a small employment ontology");

    let person = engine.create_class("Person", "A human being", None).await?;
    let employer = engine.create_class("Employer", "An employing organization", None).await?;
    let employee = engine
        .create_class("Employee", "A person under employment", Some(&person.uri))
        .await?;

    engine.add_class_attribute(&employee.uri, "age").await?;
    engine
        .add_class_object_attribute(&employee.uri, "worksFor", &employer.uri)
        .await?;
    engine.create_object(&employee.uri, "o1", "First employee").await?;

    let signature = engine.collect_signature(&employee.uri).await?;
    tracing::info!(
        params = signature.params.len(),
        obj_params = signature.obj_params.len(),
        "Employee signature collected"
    );
    for param in &signature.params {
        tracing::info!(title = ?param.title, uri = %param.uri, "datatype attribute");
    }
    for param in &signature.obj_params {
        tracing::info!(
            title = ?param.title,
            target = %param.target_class_uri,
            direction = param.relation_direction.as_i8(),
            "object attribute"
        );
    }

    let roots = engine.get_ontology_parent_classes().await?;
    tracing::info!(roots = roots.len(), "hierarchy root classes");

    let deleted = engine.delete_class(&employee.uri).await?;
    tracing::info!(deleted, "cascading delete of Employee finished");

    let remaining = engine.get_ontology().await?;
    for class in &remaining {
        tracing::info!(uri = %class.uri, "class remaining after cascade");
    }

    Ok(())
}
