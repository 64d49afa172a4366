pub mod outcome;

pub use outcome::ReconcileOutcome;

use crate::clock::{brasilia_timestamp, Clock};
use crate::config::EngineConfig;
use crate::error::BaixaError;
use crate::model::{
    ActivityDefinition, Client, DownloadedFileRecord, ExtractedValues, FieldKind, Layout,
    Notification, TaskInstance, UploadedFile,
};
use crate::period::Period;
use crate::store::{Completion, Store};

/// Everything the reconciler needs about one processed document.
pub struct ReconcileRequest<'a> {
    pub tenant_id: i64,
    pub layout: &'a Layout,
    pub values: &'a ExtractedValues,
    pub file: &'a UploadedFile,
}

/// Complete the pending task instance the extracted values point at.
///
/// Completion and its audit comment are written atomically. Archival and the
/// tenant notification happen afterwards and only log on failure.
pub fn reconcile(
    store: &mut dyn Store,
    clock: &dyn Clock,
    config: &EngineConfig,
    request: &ReconcileRequest<'_>,
) -> Result<ReconcileOutcome, BaixaError> {
    let values = request.values;
    let tax_id = values
        .tax_id
        .as_deref()
        .ok_or(BaixaError::FieldUnresolved(FieldKind::TaxId))?;
    let period = values
        .period
        .as_deref()
        .and_then(Period::find)
        .ok_or(BaixaError::FieldUnresolved(FieldKind::Period))?;

    let client = store
        .find_client_by_tax_id(request.tenant_id, tax_id)?
        .ok_or_else(|| BaixaError::ClientNotFound {
            tax_id: tax_id.to_string(),
        })?;

    let activities = store.activities_for_layout(request.layout.id)?;
    if activities.is_empty() {
        return Err(BaixaError::NoActivityLinkedToLayout {
            layout: request.layout.name.clone(),
        });
    }

    let mut obligation_ids: Vec<i64> = activities.iter().map(|a| a.obligation_id).collect();
    obligation_ids.sort_unstable();
    obligation_ids.dedup();

    let pending = store.pending_instances(client.id, &obligation_ids, period)?;
    let instance = choose_instance(&activities, &pending).ok_or_else(|| {
        BaixaError::NoPendingActivity {
            period: period.to_string(),
        }
    })?;

    if instance.type_tag != config.eligible_type_tag {
        return Err(BaixaError::WrongActivityType {
            found: instance.type_tag.clone(),
        });
    }

    let completed_at = brasilia_timestamp(clock.now_utc());
    let completion = Completion {
        task_instance_id: instance.id,
        group_id: instance.group_id,
        completed_at: completed_at.clone(),
        comment: audit_comment(request, tax_id, period, &instance.activity_text),
    };
    if !store.complete_instance(&completion)? {
        return Err(BaixaError::NoPendingActivity {
            period: period.to_string(),
        });
    }
    tracing::info!(
        task_instance = instance.id,
        client = %client.name,
        %period,
        "task instance completed"
    );

    let archived = archive(store, &client, instance, request.file);
    let notified = notify(store, request.tenant_id, &client, instance, period);

    let department = values
        .obligation
        .as_deref()
        .and_then(|o| config.department_for(o))
        .or_else(|| config.department_for(&request.layout.name))
        .map(str::to_string);

    Ok(ReconcileOutcome {
        task_instance_id: instance.id,
        client_id: client.id,
        client_name: client.name.clone(),
        activity_text: instance.activity_text.clone(),
        period,
        completed_at,
        archived,
        notified,
        department,
    })
}

/// Prefer an instance whose activity text equals a linked activity (in
/// activity order); otherwise take the first pending one.
fn choose_instance<'p>(
    activities: &[ActivityDefinition],
    pending: &'p [TaskInstance],
) -> Option<&'p TaskInstance> {
    let exact = activities.iter().find_map(|activity| {
        pending
            .iter()
            .find(|t| t.activity_text == activity.activity_text)
    });
    if exact.is_some() {
        return exact;
    }

    let first = pending.first()?;
    tracing::warn!(
        task_instance = first.id,
        activity = %first.activity_text,
        "no activity text matched; completing first pending instance"
    );
    Some(first)
}

fn audit_comment(
    request: &ReconcileRequest<'_>,
    tax_id: &str,
    period: Period,
    activity: &str,
) -> String {
    let obligation = request.values.obligation.as_deref().unwrap_or("-");
    format!(
        "Baixa automática pelo layout '{}' (arquivo {}). Obrigação: {obligation}; \
         inscrição: {tax_id}; competência: {period}; atividade: {activity}",
        request.layout.name, request.file.filename,
    )
}

fn archive(
    store: &mut dyn Store,
    client: &Client,
    instance: &TaskInstance,
    file: &UploadedFile,
) -> bool {
    let record = DownloadedFileRecord {
        client_id: client.id,
        task_instance_id: instance.id,
        filename: file.filename.clone(),
        bytes: file.bytes.clone(),
    };
    let archived = match store.archive_file(&record) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task_instance = instance.id, error = %e, "failed to archive document");
            false
        }
    };
    let attached = match store.attach_file(instance.id, &file.filename, &file.bytes) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task_instance = instance.id, error = %e, "failed to attach document");
            false
        }
    };
    archived && attached
}

fn notify(
    store: &mut dyn Store,
    tenant_id: i64,
    client: &Client,
    instance: &TaskInstance,
    period: Period,
) -> bool {
    let notification = Notification {
        tenant_id,
        title: "Atividade concluída automaticamente".to_string(),
        message: format!("{} - {} ({period})", instance.activity_text, client.name),
    };

    let Err(primary) = store.insert_notification(&notification) else {
        return true;
    };
    tracing::warn!(error = %primary, "notification failed; retrying on fallback store");
    match store.insert_notification_fallback(&notification) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "fallback notification failed");
            false
        }
    }
}
