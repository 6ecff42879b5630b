use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::date::DateValue;
use crate::error::{ModelError, Result};
use crate::registry::Keyed;
use crate::tasks::TaskRegistry;

/// Longest title accepted for tasks and requirements, in characters.
pub const TITLE_MAX_LEN: usize = 14;

/// The kinds of entity held by the model, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Requirement,
    Task,
    Member,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Requirement => "requirement",
            Self::Task => "task",
            Self::Member => "member",
        })
    }
}

/// Progress state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Started,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "Started",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Started" => Ok(Self::Started),
            "Completed" => Ok(Self::Completed),
            _ => Err(ModelError::invalid(format!(
                "task status must be one of [\"Started\", \"Completed\"], got {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Importance of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityGroup {
    Critical,
    High,
    Low,
}

impl PriorityGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Low => "Low",
        }
    }
}

impl FromStr for PriorityGroup {
    type Err = ModelError;

    /// Accepts exactly `"Critical"`, `"High"` or `"Low"`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Critical" => Ok(Self::Critical),
            "High" => Ok(Self::High),
            "Low" => Ok(Self::Low),
            _ => Err(ModelError::invalid(format!(
                "priority group must be one of [\"Critical\", \"High\", \"Low\"], got {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for PriorityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three role slots of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Creator,
    ProductOwner,
    ScrumMaster,
}

impl ProjectRole {
    pub const ALL: [ProjectRole; 3] = [Self::Creator, Self::ProductOwner, Self::ScrumMaster];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::ProductOwner => "product-owner",
            Self::ScrumMaster => "scrum-master",
        }
    }
}

impl FromStr for ProjectRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "creator" => Ok(Self::Creator),
            "owner" | "product-owner" => Ok(Self::ProductOwner),
            "scrum-master" | "sm" => Ok(Self::ScrumMaster),
            _ => Err(ModelError::invalid(format!("unknown project role {:?}", s))),
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn validate_title(kind: EntityKind, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(ModelError::invalid(format!("{} title cannot be empty", kind)));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ModelError::invalid(format!(
            "{} title cannot be longer than {} characters",
            kind, TITLE_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ModelError::invalid(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ModelError::invalid(format!("{:?} is not an email address", email))),
    }
}

/// Adds `id` to a link list. Returns false when it was already there.
fn link(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|x| x == id) {
        return false;
    }
    list.push(id.to_owned());
    true
}

fn unlink(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|x| x != id);
    list.len() != before
}

/// A person in the organisation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    /// Derived from name and email when the member is hired.
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    birthday: DateValue,
    /// Ids of the tasks this member works on.
    #[serde(default)]
    assigned_tasks: Vec<String>,
}

impl Member {
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        birthday: DateValue,
        phone: Option<String>,
    ) -> Result<Self> {
        validate_name("first name", first_name)?;
        validate_name("last name", last_name)?;
        validate_email(email)?;
        Ok(Self {
            id: Self::derive_id(first_name, last_name, email),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: email.to_owned(),
            phone,
            birthday,
            assigned_tasks: Vec::new(),
        })
    }

    /// `first.last/email`, lowercased with whitespace replaced by `-`.
    pub fn derive_id(first_name: &str, last_name: &str, email: &str) -> String {
        format!("{}.{}/{}", first_name.trim(), last_name.trim(), email.trim())
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn birthday(&self) -> DateValue {
        self.birthday
    }

    pub fn assigned_tasks(&self) -> &[String] {
        &self.assigned_tasks
    }

    pub fn is_assigned_to(&self, task_id: &str) -> bool {
        self.assigned_tasks.iter().any(|id| id == task_id)
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone;
    }

    pub fn set_birthday(&mut self, birthday: DateValue) {
        self.birthday = birthday;
    }

    /// Re-runs the field checks of [`Member::new`].
    pub(crate) fn validate(&self) -> Result<()> {
        validate_name("first name", &self.first_name)?;
        validate_name("last name", &self.last_name)?;
        validate_email(&self.email)
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub(crate) fn set_name(&mut self, first_name: &str, last_name: &str) -> Result<()> {
        validate_name("first name", first_name)?;
        validate_name("last name", last_name)?;
        self.first_name = first_name.to_owned();
        self.last_name = last_name.to_owned();
        Ok(())
    }

    pub(crate) fn set_email(&mut self, email: &str) -> Result<()> {
        validate_email(email)?;
        self.email = email.to_owned();
        Ok(())
    }

    pub(crate) fn link_task(&mut self, task_id: &str) -> bool {
        link(&mut self.assigned_tasks, task_id)
    }

    pub(crate) fn unlink_task(&mut self, task_id: &str) -> bool {
        unlink(&mut self.assigned_tasks, task_id)
    }
}

impl Keyed for Member {
    const KIND: EntityKind = EntityKind::Member;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A unit of work inside a project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Owning project id + `T` + random body.
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: TaskStatus,
    estimated_work_hours: f64,
    #[serde(default)]
    total_worked_hours: f64,
    deadline: DateValue,
    #[serde(default)]
    assigned_requirements: Vec<String>,
    #[serde(default)]
    assigned_members: Vec<String>,
}

impl Task {
    pub(crate) fn new(
        id: String,
        title: &str,
        description: &str,
        estimated_work_hours: f64,
        deadline: DateValue,
    ) -> Result<Self> {
        validate_title(EntityKind::Task, title)?;
        check_estimate(estimated_work_hours)?;
        Ok(Self {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            status: TaskStatus::Started,
            estimated_work_hours,
            total_worked_hours: 0.0,
            deadline,
            assigned_requirements: Vec::new(),
            assigned_members: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn estimated_work_hours(&self) -> f64 {
        self.estimated_work_hours
    }

    pub fn total_worked_hours(&self) -> f64 {
        self.total_worked_hours
    }

    pub fn deadline(&self) -> DateValue {
        self.deadline
    }

    pub fn assigned_requirements(&self) -> &[String] {
        &self.assigned_requirements
    }

    pub fn assigned_members(&self) -> &[String] {
        &self.assigned_members
    }

    pub fn is_linked_to_requirement(&self, requirement_id: &str) -> bool {
        self.assigned_requirements.iter().any(|id| id == requirement_id)
    }

    pub fn is_assigned_to_member(&self, member_id: &str) -> bool {
        self.assigned_members.iter().any(|id| id == member_id)
    }

    /// Title uniqueness inside the project is checked by the task registry;
    /// this only enforces the length rule.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_title(EntityKind::Task, &self.title)?;
        check_estimate(self.estimated_work_hours)?;
        check_worked(self.total_worked_hours)
    }

    pub(crate) fn set_title(&mut self, title: &str) -> Result<()> {
        validate_title(EntityKind::Task, title)?;
        self.title = title.to_owned();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub fn set_estimated_work_hours(&mut self, hours: f64) -> Result<()> {
        check_estimate(hours)?;
        self.estimated_work_hours = hours;
        Ok(())
    }

    pub fn set_total_worked_hours(&mut self, hours: f64) -> Result<()> {
        check_worked(hours)?;
        self.total_worked_hours = hours;
        Ok(())
    }

    /// Logs `hours` more work on the task.
    pub fn add_worked_hours(&mut self, hours: f64) -> Result<()> {
        check_worked(hours)?;
        self.total_worked_hours += hours;
        Ok(())
    }

    /// Re-estimates the task so that `remaining` hours are left on top of
    /// what has been worked already.
    pub fn reestimate(&mut self, remaining: f64) -> Result<()> {
        check_worked(remaining)?;
        self.set_estimated_work_hours(self.total_worked_hours + remaining)
    }

    pub(crate) fn set_deadline(&mut self, deadline: DateValue) {
        self.deadline = deadline;
    }

    pub(crate) fn link_requirement(&mut self, requirement_id: &str) -> bool {
        link(&mut self.assigned_requirements, requirement_id)
    }

    pub(crate) fn unlink_requirement(&mut self, requirement_id: &str) -> bool {
        unlink(&mut self.assigned_requirements, requirement_id)
    }

    pub(crate) fn link_member(&mut self, member_id: &str) -> bool {
        link(&mut self.assigned_members, member_id)
    }

    pub(crate) fn unlink_member(&mut self, member_id: &str) -> bool {
        unlink(&mut self.assigned_members, member_id)
    }
}

impl Keyed for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }
}

fn check_estimate(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 1.0 {
        return Err(ModelError::invalid(format!(
            "estimated work hours must be at least 1, got {}",
            hours
        )));
    }
    Ok(())
}

fn check_worked(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ModelError::invalid(format!(
            "work hours cannot be negative, got {}",
            hours
        )));
    }
    Ok(())
}

/// Something the project has to deliver, covered by one or more tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Owning project id + `R` + random body.
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    deadline: DateValue,
    priority_group: PriorityGroup,
    #[serde(default)]
    approved: bool,
    #[serde(default)]
    assigned_tasks: Vec<String>,
}

impl Requirement {
    pub(crate) fn new(
        id: String,
        title: &str,
        description: &str,
        deadline: DateValue,
        priority_group: PriorityGroup,
    ) -> Result<Self> {
        validate_title(EntityKind::Requirement, title)?;
        Ok(Self {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            deadline,
            priority_group,
            approved: false,
            assigned_tasks: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn deadline(&self) -> DateValue {
        self.deadline
    }

    pub fn priority_group(&self) -> PriorityGroup {
        self.priority_group
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn assigned_tasks(&self) -> &[String] {
        &self.assigned_tasks
    }

    pub fn is_linked_to_task(&self, task_id: &str) -> bool {
        self.assigned_tasks.iter().any(|id| id == task_id)
    }

    /// Fraction of the assigned tasks that are completed, 0 when no task is
    /// assigned.
    pub fn status(&self, tasks: &TaskRegistry) -> f64 {
        if self.assigned_tasks.is_empty() {
            return 0.0;
        }
        let completed = self
            .assigned_tasks
            .iter()
            .filter(|id| tasks.get(id).is_ok_and(|t| t.is_completed()))
            .count();
        completed as f64 / self.assigned_tasks.len() as f64
    }

    /// Sum of the estimates of the assigned tasks.
    pub fn estimated_work_hours(&self, tasks: &TaskRegistry) -> f64 {
        self.assigned_tasks
            .iter()
            .filter_map(|id| tasks.get(id).ok())
            .map(|t| t.estimated_work_hours())
            .sum()
    }

    pub fn total_worked_hours(&self, tasks: &TaskRegistry) -> f64 {
        self.assigned_tasks
            .iter()
            .filter_map(|id| tasks.get(id).ok())
            .map(|t| t.total_worked_hours())
            .sum()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_title(EntityKind::Requirement, &self.title)
    }

    pub(crate) fn set_title(&mut self, title: &str) -> Result<()> {
        validate_title(EntityKind::Requirement, title)?;
        self.title = title.to_owned();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }

    pub fn set_priority_group(&mut self, priority_group: PriorityGroup) {
        self.priority_group = priority_group;
    }

    pub fn set_approved(&mut self, approved: bool) {
        self.approved = approved;
    }

    pub(crate) fn set_deadline(&mut self, deadline: DateValue) {
        self.deadline = deadline;
    }

    pub(crate) fn link_task(&mut self, task_id: &str) -> bool {
        link(&mut self.assigned_tasks, task_id)
    }

    pub(crate) fn unlink_task(&mut self, task_id: &str) -> bool {
        unlink(&mut self.assigned_tasks, task_id)
    }
}

impl Keyed for Requirement {
    const KIND: EntityKind = EntityKind::Requirement;

    fn id(&self) -> &str {
        &self.id
    }
}
