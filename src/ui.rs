use crate::dashboard::{Section, ViewState};
use crate::models::{Task, TaskStats, TaskStatus};
use crate::notify::Notification;
use crate::storage::Settings;
use chrono::{DateTime, Local, NaiveDateTime};

pub const EMPTY_RECENT_TASKS: &str =
    r#"<p class="placeholder">No tasks found</p>"#;
pub const EMPTY_TASKS_GRID: &str =
    r#"<p class="placeholder placeholder-grid">No tasks found</p>"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders a backend timestamp in local time. Timestamps without an offset
/// are taken as already local. Anything unparseable is shown as-is.
pub fn format_date(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format(DISPLAY).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(DISPLAY).to_string();
    }
    raw.to_string()
}

fn render_task_info(task: &Task) -> String {
    let description = task.description.as_deref().unwrap_or("No description");
    let updated = task
        .updated_at
        .as_deref()
        .map(|at| format!("<span>Updated: {}</span>", escape_html(&format_date(at))))
        .unwrap_or_default();

    format!(
        r#"<div class="task-info">
        <div class="task-title">{title}</div>
        <div class="task-description">{description}</div>
        <div class="task-meta">
          <span class="task-status {class}">{label}</span>
          <span>Created: {created}</span>
          {updated}
        </div>
      </div>"#,
        title = escape_html(&task.title),
        description = escape_html(description),
        class = task.status.css_class(),
        label = task.status.label(),
        created = escape_html(&format_date(&task.created_at)),
    )
}

fn render_delete_form(id: u64, label: &str) -> String {
    format!(
        r#"<form method="post" action="/tasks/{id}/delete" onsubmit="return confirm('Are you sure you want to delete this task?');">
          <button class="btn btn-danger" type="submit" title="Delete">{label}</button>
        </form>"#
    )
}

/// Contents of the `recent-tasks-list` container.
pub fn render_recent_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_RECENT_TASKS.to_string();
    }

    tasks
        .iter()
        .map(|task| {
            format!(
                r#"<div class="task-item">
      {info}
      <div class="task-actions">
        <a class="btn btn-secondary" href="/tasks/{id}/edit" title="Edit">&#9998;</a>
        {delete}
      </div>
    </div>"#,
                info = render_task_info(task),
                id = task.id,
                delete = render_delete_form(task.id, "&#128465;"),
            )
        })
        .collect()
}

/// Contents of the `tasks-grid` container.
pub fn render_tasks_grid(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_TASKS_GRID.to_string();
    }

    tasks
        .iter()
        .map(|task| {
            format!(
                r#"<div class="task-card">
      {info}
      <div class="task-actions">
        <a class="btn btn-secondary" href="/tasks/{id}/edit">&#9998; Edit</a>
        {delete}
      </div>
    </div>"#,
                info = render_task_info(task),
                id = task.id,
                delete = render_delete_form(task.id, "&#128465; Delete"),
            )
        })
        .collect()
}

pub fn format_completion_rate(rate: f64) -> String {
    format!("{rate:.1}%")
}

fn render_stats(stats: Option<&TaskStats>) -> [String; 4] {
    match stats {
        Some(stats) => [
            stats.total_tasks.to_string(),
            stats.pending_tasks.to_string(),
            stats.completed_tasks.to_string(),
            format_completion_rate(stats.completion_rate),
        ],
        None => ["-".into(), "-".into(), "-".into(), "-".into()],
    }
}

fn render_status_options(selected: Option<TaskStatus>, include_all: bool) -> String {
    let mut out = String::new();
    if include_all {
        let mark = if selected.is_none() { " selected" } else { "" };
        out.push_str(&format!(r#"<option value=""{mark}>All tasks</option>"#));
    }
    for status in TaskStatus::SUBMITTABLE {
        let mark = if selected == Some(status) { " selected" } else { "" };
        out.push_str(&format!(
            r#"<option value="{value}"{mark}>{label}</option>"#,
            value = status.as_str(),
            label = status.label(),
        ));
    }
    out
}

fn render_edit_modal(task: Option<&Task>) -> String {
    let Some(task) = task else {
        return String::new();
    };

    format!(
        r#"<div class="modal open" id="editTaskModal">
    <div class="modal-content">
      <h2>Edit task</h2>
      <form id="editTaskForm" method="post" action="/tasks/{id}">
        <label>Title <input id="editTaskTitle" name="title" value="{title}" maxlength="200" required autofocus /></label>
        <label>Description <textarea id="editTaskDescription" name="description" maxlength="1000">{description}</textarea></label>
        <label>Status <select id="editTaskStatus" name="status">{options}</select></label>
        <div class="modal-actions">
          <button class="btn btn-primary" type="submit">Save</button>
        </div>
      </form>
      <form method="post" action="/tasks/edit/cancel">
        <button class="btn btn-secondary" type="submit">Cancel</button>
      </form>
    </div>
  </div>"#,
        id = task.id,
        title = escape_html(&task.title),
        description = escape_html(task.description.as_deref().unwrap_or("")),
        options = render_status_options(Some(task.status), false),
    )
}

fn render_notification(notification: Option<&Notification>) -> String {
    match notification {
        Some(n) => format!(
            r#"<div id="notification" class="notification {kind} show">{message}</div>"#,
            kind = n.kind.as_str(),
            message = escape_html(&n.message),
        ),
        None => r#"<div id="notification" class="notification"></div>"#.to_string(),
    }
}

pub struct PageView<'a> {
    pub view: &'a ViewState,
    pub settings: &'a Settings,
    pub notification: Option<&'a Notification>,
    pub loading: bool,
}

pub fn render_page(page: &PageView<'_>) -> String {
    let view = page.view;
    let active = |section: Section| if view.section == section { " active" } else { "" };
    let [total, pending, completed, rate] = render_stats(view.stats.as_ref());
    let metrics = view
        .metrics_text
        .as_deref()
        .map(|text| format!("<pre>{}</pre>", escape_html(text)))
        .unwrap_or_else(|| r#"<p class="placeholder">No metrics loaded</p>"#.to_string());

    let refresh = page.settings.refresh_interval_secs.to_string();
    let filter_options = render_status_options(view.status_filter, true);
    let create_options = render_status_options(None, false);
    let api_url = escape_html(&page.settings.api_base_url);
    let edit_modal = render_edit_modal(view.editing.as_ref());
    let notification = render_notification(page.notification);

    fill_template(PAGE_HTML, |name| match name {
        "REFRESH_SECS" => Some(refresh.as_str()),
        "NAV_DASHBOARD" => Some(active(Section::Dashboard)),
        "NAV_TASKS" => Some(active(Section::Tasks)),
        "NAV_METRICS" => Some(active(Section::Metrics)),
        "NAV_SETTINGS" => Some(active(Section::Settings)),
        "TOTAL" => Some(total.as_str()),
        "PENDING" => Some(pending.as_str()),
        "COMPLETED" => Some(completed.as_str()),
        "RATE" => Some(rate.as_str()),
        "FILTER_OPTIONS" => Some(filter_options.as_str()),
        "CREATE_OPTIONS" => Some(create_options.as_str()),
        "API_URL" => Some(api_url.as_str()),
        "METRICS" => Some(metrics.as_str()),
        "EDIT_MODAL" => Some(edit_modal.as_str()),
        "LOADING" => Some(if page.loading { " show" } else { "" }),
        "NOTIFICATION" => Some(notification.as_str()),
        "RECENT_TASKS" => Some(view.recent_tasks.as_str()),
        "TASKS_GRID" => Some(view.tasks_grid.as_str()),
        _ => None,
    })
}

/// Substitutes `{{NAME}}` markers in one pass over `template`. Inserted
/// values are never scanned again; unknown markers are kept verbatim.
fn fill_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        match lookup(&after[..close]) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta http-equiv="refresh" content="{{REFRESH_SECS}}" />
  <title>Tasky Dashboard</title>
  <style>
    :root {
      --bg: #f4f6fb;
      --ink: #23262f;
      --muted: #6b7080;
      --accent: #4a6cf7;
      --danger: #d64545;
      --ok: #2d8a55;
      --card: #ffffff;
      --shadow: 0 12px 32px rgba(35, 38, 47, 0.08);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      display: grid;
      grid-template-columns: 220px 1fr;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
    }

    .sidebar {
      background: #1f2330;
      color: #dfe3ee;
      padding: 24px 12px;
      display: grid;
      align-content: start;
      gap: 6px;
    }

    .sidebar h1 { font-size: 1.3rem; margin: 0 12px 18px; }

    .nav-item {
      color: inherit;
      text-decoration: none;
      padding: 10px 12px;
      border-radius: 10px;
    }

    .nav-item.active { background: rgba(255, 255, 255, 0.12); }

    main { padding: 28px; display: grid; gap: 24px; align-content: start; }

    .header { display: flex; justify-content: space-between; align-items: center; gap: 12px; }
    .header-actions { display: flex; gap: 8px; }

    .section { display: none; gap: 20px; }
    .section.active { display: grid; }

    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 16px; }
    .stat { background: var(--card); border-radius: 14px; padding: 16px; box-shadow: var(--shadow); }
    .stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: var(--muted); }
    .stat .value { font-size: 1.7rem; font-weight: 600; }

    .task-item, .task-card {
      background: var(--card);
      border-radius: 14px;
      padding: 16px;
      box-shadow: var(--shadow);
      display: flex;
      justify-content: space-between;
      gap: 12px;
    }

    #recent-tasks-list { display: grid; gap: 12px; }
    #tasks-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 16px; }
    .task-card { flex-direction: column; }

    .task-title { font-weight: 600; }
    .task-description { color: var(--muted); margin: 4px 0 8px; }
    .task-meta { display: flex; flex-wrap: wrap; gap: 10px; font-size: 0.85rem; color: var(--muted); }
    .task-status { border-radius: 999px; padding: 2px 10px; font-weight: 600; }
    .task-status.pending { background: #fff3d6; color: #9a6b00; }
    .task-status.in-progress { background: #dfe8ff; color: #2c4bc7; }
    .task-status.completed { background: #dcf5e6; color: var(--ok); }
    .task-actions { display: flex; gap: 6px; align-items: start; }
    .task-actions form { margin: 0; }

    .placeholder { color: #666; text-align: center; padding: 2rem; }
    .placeholder-grid { grid-column: 1 / -1; }

    .btn {
      appearance: none;
      border: none;
      border-radius: 10px;
      padding: 8px 14px;
      font-size: 0.95rem;
      cursor: pointer;
      text-decoration: none;
      display: inline-flex;
      align-items: center;
      gap: 6px;
    }
    .btn-primary { background: var(--accent); color: white; }
    .btn-secondary { background: #e6e9f2; color: var(--ink); }
    .btn-danger { background: var(--danger); color: white; }

    form.stacked { display: grid; gap: 12px; max-width: 520px; }
    label { display: grid; gap: 4px; font-size: 0.9rem; color: var(--muted); }
    input, textarea, select { font: inherit; padding: 8px 10px; border-radius: 8px; border: 1px solid #ccd1de; }

    details.create { background: var(--card); border-radius: 14px; padding: 16px; box-shadow: var(--shadow); }

    .modal { position: fixed; inset: 0; background: rgba(20, 22, 30, 0.45); display: grid; place-items: center; }
    .modal-content { background: var(--card); border-radius: 16px; padding: 24px; width: min(520px, 92vw); display: grid; gap: 12px; }
    .modal-content form { display: grid; gap: 12px; }

    pre { background: #1f2330; color: #dfe3ee; padding: 16px; border-radius: 12px; overflow: auto; max-height: 60vh; }

    .loading { position: fixed; inset: 0; display: none; place-items: center; background: rgba(255, 255, 255, 0.6); }
    .loading.show { display: grid; }

    .notification {
      position: fixed;
      right: 24px;
      bottom: 24px;
      padding: 12px 18px;
      border-radius: 10px;
      color: white;
      opacity: 0;
      transition: opacity 200ms ease;
    }
    .notification.show { opacity: 1; }
    .notification.success { background: var(--ok); }
    .notification.error { background: var(--danger); }
    .notification.info { background: var(--accent); }

    @media (max-width: 768px) {
      body { grid-template-columns: 1fr; }
    }
  </style>
</head>
<body>
  <nav class="sidebar">
    <h1>Tasky</h1>
    <a class="nav-item{{NAV_DASHBOARD}}" href="/section/dashboard">Dashboard</a>
    <a class="nav-item{{NAV_TASKS}}" href="/section/tasks">Tasks</a>
    <a class="nav-item{{NAV_METRICS}}" href="/section/metrics">Metrics</a>
    <a class="nav-item{{NAV_SETTINGS}}" href="/section/settings">Settings</a>
  </nav>

  <main>
    <div class="header">
      <h2>Task Management Dashboard</h2>
      <div class="header-actions">
        <form method="post" action="/refresh">
          <button class="btn btn-secondary" type="submit">Refresh</button>
        </form>
      </div>
    </div>

    <section id="dashboard" class="section{{NAV_DASHBOARD}}">
      <div class="stats">
        <div class="stat"><span class="label">Total tasks</span><div id="total-tasks" class="value">{{TOTAL}}</div></div>
        <div class="stat"><span class="label">Pending</span><div id="pending-tasks" class="value">{{PENDING}}</div></div>
        <div class="stat"><span class="label">Completed</span><div id="completed-tasks" class="value">{{COMPLETED}}</div></div>
        <div class="stat"><span class="label">Completion rate</span><div id="completion-rate" class="value">{{RATE}}</div></div>
      </div>
      <h3>Recent tasks</h3>
      <div id="recent-tasks-list">{{RECENT_TASKS}}</div>
    </section>

    <section id="tasks" class="section{{NAV_TASKS}}">
      <form class="filter" method="get" action="/tasks/filter">
        <select id="status-filter" name="status" onchange="this.form.submit()">{{FILTER_OPTIONS}}</select>
        <noscript><button class="btn btn-secondary" type="submit">Filter</button></noscript>
      </form>
      <details class="create" id="createTaskModal">
        <summary>New task</summary>
        <form id="createTaskForm" class="stacked" method="post" action="/tasks">
          <label>Title <input id="taskTitle" name="title" maxlength="200" required /></label>
          <label>Description <textarea id="taskDescription" name="description" maxlength="1000"></textarea></label>
          <label>Status <select id="taskStatus" name="status">{{CREATE_OPTIONS}}</select></label>
          <button class="btn btn-primary" type="submit">Create task</button>
        </form>
      </details>
      <div id="tasks-grid">{{TASKS_GRID}}</div>
    </section>

    <section id="metrics" class="section{{NAV_METRICS}}">
      <h3>Backend metrics</h3>
      {{METRICS}}
    </section>

    <section id="settings" class="section{{NAV_SETTINGS}}">
      <h3>Settings</h3>
      <form class="stacked" method="post" action="/settings">
        <label>API base URL <input id="api-url" name="api_url" value="{{API_URL}}" /></label>
        <label>Refresh interval (seconds) <input id="refresh-interval" name="refresh_interval" type="number" min="1" value="{{REFRESH_SECS}}" /></label>
        <button class="btn btn-primary" type="submit">Save settings</button>
      </form>
    </section>
  </main>

  {{EDIT_MODAL}}

  <div id="loading" class="loading{{LOADING}}">Loading...</div>
  {{NOTIFICATION}}
</body>
</html>
"#;
