//! Draft edits.
//!
//! One `EditOp` variant per section type, each carrying that section's edit
//! vocabulary. Every list sub-editor follows the same pattern: `add_*` appends
//! a default element, `remove_*` deletes by index (later items shift down),
//! `update_*` replaces one element by index. An out-of-range index fails the
//! whole edit and leaves the draft untouched.
//!
//! Wire form: `{"section": "skills", "edit": {"op": "add_skill", "category": 0}}`

use serde::{Deserialize, Serialize};

use crate::schema::{
    ContactContent, ContactDetails, ContactLink, Experience, ExperienceContent, IntroContent,
    Project, ProjectsContent, SectionContent, SectionId, Skill, SkillCategory, SkillsContent,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("{op} edit does not apply to the {draft} draft")]
    SectionMismatch { op: SectionId, draft: SectionId },

    #[error("{field} index {index} out of range (len {len})")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "edit", rename_all = "lowercase")]
pub enum EditOp {
    Hero(IntroEdit),
    About(IntroEdit),
    Skills(SkillsEdit),
    Projects(ProjectsEdit),
    Experience(ExperienceEdit),
    Contact(ContactEdit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IntroEdit {
    SetTitle { value: Option<String> },
    SetSubtitle { value: Option<String> },
    SetDescription { value: Option<String> },
    SetImage { value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SkillsEdit {
    SetTitle { value: Option<String> },
    SetDescription { value: Option<String> },
    AddCategory,
    RemoveCategory { category: usize },
    RenameCategory { category: usize, name: String },
    AddSkill { category: usize },
    RemoveSkill { category: usize, skill: usize },
    UpdateSkill { category: usize, skill: usize, value: Skill },
    SetSkillIcon { category: usize, skill: usize, icon: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProjectsEdit {
    SetTitle { value: String },
    SetDescription { value: String },
    AddProject,
    RemoveProject { project: usize },
    UpdateProject { project: usize, value: Project },
    AddTechnology { project: usize },
    RemoveTechnology { project: usize, technology: usize },
    UpdateTechnology { project: usize, technology: usize, value: String },
    AddImage { project: usize, url: String },
    RemoveImage { project: usize, image: usize },
    SetVideo { project: usize, url: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExperienceEdit {
    SetTitle { value: String },
    SetDescription { value: String },
    AddExperience,
    RemoveExperience { experience: usize },
    UpdateExperience { experience: usize, value: Experience },
    AddBullet { experience: usize },
    RemoveBullet { experience: usize, bullet: usize },
    UpdateBullet { experience: usize, bullet: usize, value: String },
    AddTechnology { experience: usize },
    RemoveTechnology { experience: usize, technology: usize },
    UpdateTechnology { experience: usize, technology: usize, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ContactEdit {
    SetTitle { value: Option<String> },
    SetDescription { value: Option<String> },
    SetDetails { value: Option<ContactDetails> },
    AddLink,
    RemoveLink { link: usize },
    UpdateLink { link: usize, value: ContactLink },
    SetLinkIcon { link: usize, icon: Option<String> },
}

impl EditOp {
    pub fn section(&self) -> SectionId {
        match self {
            EditOp::Hero(_) => SectionId::Hero,
            EditOp::About(_) => SectionId::About,
            EditOp::Skills(_) => SectionId::Skills,
            EditOp::Projects(_) => SectionId::Projects,
            EditOp::Experience(_) => SectionId::Experience,
            EditOp::Contact(_) => SectionId::Contact,
        }
    }

    /// Apply to a draft of the same section.
    pub fn apply(self, draft: &mut SectionContent) -> Result<(), EditError> {
        let op_section = self.section();
        let draft_section = draft.id();

        match (self, draft) {
            (EditOp::Hero(edit), SectionContent::Hero(content))
            | (EditOp::About(edit), SectionContent::About(content)) => {
                apply_intro(edit, content);
                Ok(())
            }
            (EditOp::Skills(edit), SectionContent::Skills(content)) => apply_skills(edit, content),
            (EditOp::Projects(edit), SectionContent::Projects(content)) => {
                apply_projects(edit, content)
            }
            (EditOp::Experience(edit), SectionContent::Experience(content)) => {
                apply_experience(edit, content)
            }
            (EditOp::Contact(edit), SectionContent::Contact(content)) => {
                apply_contact(edit, content)
            }
            _ => Err(EditError::SectionMismatch {
                op: op_section,
                draft: draft_section,
            }),
        }
    }
}

// ============================================================================
// List Helpers
// ============================================================================

fn item_mut<'a, T>(
    list: &'a mut [T],
    index: usize,
    field: &'static str,
) -> Result<&'a mut T, EditError> {
    let len = list.len();
    list.get_mut(index)
        .ok_or(EditError::IndexOutOfRange { field, index, len })
}

fn remove_at<T>(list: &mut Vec<T>, index: usize, field: &'static str) -> Result<(), EditError> {
    if index >= list.len() {
        return Err(EditError::IndexOutOfRange {
            field,
            index,
            len: list.len(),
        });
    }
    list.remove(index);
    Ok(())
}

fn replace_at<T>(list: &mut [T], index: usize, field: &'static str, value: T) -> Result<(), EditError> {
    *item_mut(list, index, field)? = value;
    Ok(())
}

// ============================================================================
// Per-Section Reducers
// ============================================================================

fn apply_intro(edit: IntroEdit, content: &mut IntroContent) {
    match edit {
        IntroEdit::SetTitle { value } => content.title = value,
        IntroEdit::SetSubtitle { value } => content.subtitle = value,
        IntroEdit::SetDescription { value } => content.description = value,
        IntroEdit::SetImage { value } => content.image = value,
    }
}

fn apply_skills(edit: SkillsEdit, content: &mut SkillsContent) -> Result<(), EditError> {
    match edit {
        SkillsEdit::SetTitle { value } => content.title = value,
        SkillsEdit::SetDescription { value } => content.description = value,
        SkillsEdit::AddCategory => content.categories.push(SkillCategory::default()),
        SkillsEdit::RemoveCategory { category } => {
            remove_at(&mut content.categories, category, "category")?
        }
        SkillsEdit::RenameCategory { category, name } => {
            item_mut(&mut content.categories, category, "category")?.name = name
        }
        SkillsEdit::AddSkill { category } => item_mut(&mut content.categories, category, "category")?
            .skills
            .push(Skill::default()),
        SkillsEdit::RemoveSkill { category, skill } => {
            let category = item_mut(&mut content.categories, category, "category")?;
            remove_at(&mut category.skills, skill, "skill")?
        }
        SkillsEdit::UpdateSkill { category, skill, mut value } => {
            value.level = value.level.min(100);
            let category = item_mut(&mut content.categories, category, "category")?;
            replace_at(&mut category.skills, skill, "skill", value)?
        }
        SkillsEdit::SetSkillIcon { category, skill, icon } => {
            let category = item_mut(&mut content.categories, category, "category")?;
            item_mut(&mut category.skills, skill, "skill")?.icon = icon
        }
    }
    Ok(())
}

fn apply_projects(edit: ProjectsEdit, content: &mut ProjectsContent) -> Result<(), EditError> {
    match edit {
        ProjectsEdit::SetTitle { value } => content.title = value,
        ProjectsEdit::SetDescription { value } => content.description = value,
        ProjectsEdit::AddProject => content.projects.push(Project::default()),
        ProjectsEdit::RemoveProject { project } => {
            remove_at(&mut content.projects, project, "project")?
        }
        ProjectsEdit::UpdateProject { project, value } => {
            replace_at(&mut content.projects, project, "project", value)?
        }
        ProjectsEdit::AddTechnology { project } => {
            item_mut(&mut content.projects, project, "project")?
                .technologies
                .push(String::new())
        }
        ProjectsEdit::RemoveTechnology { project, technology } => {
            let project = item_mut(&mut content.projects, project, "project")?;
            remove_at(&mut project.technologies, technology, "technology")?
        }
        ProjectsEdit::UpdateTechnology { project, technology, value } => {
            let project = item_mut(&mut content.projects, project, "project")?;
            replace_at(&mut project.technologies, technology, "technology", value)?
        }
        ProjectsEdit::AddImage { project, url } => {
            item_mut(&mut content.projects, project, "project")?.image.push(url)
        }
        ProjectsEdit::RemoveImage { project, image } => {
            let project = item_mut(&mut content.projects, project, "project")?;
            let len = project.image.urls().len();
            if !project.image.remove(image) {
                return Err(EditError::IndexOutOfRange {
                    field: "image",
                    index: image,
                    len,
                });
            }
        }
        ProjectsEdit::SetVideo { project, url } => {
            item_mut(&mut content.projects, project, "project")?.video = url
        }
    }
    Ok(())
}

fn apply_experience(edit: ExperienceEdit, content: &mut ExperienceContent) -> Result<(), EditError> {
    match edit {
        ExperienceEdit::SetTitle { value } => content.title = value,
        ExperienceEdit::SetDescription { value } => content.description = value,
        ExperienceEdit::AddExperience => content.experiences.push(Experience::default()),
        ExperienceEdit::RemoveExperience { experience } => {
            remove_at(&mut content.experiences, experience, "experience")?
        }
        ExperienceEdit::UpdateExperience { experience, value } => {
            replace_at(&mut content.experiences, experience, "experience", value)?
        }
        ExperienceEdit::AddBullet { experience } => {
            item_mut(&mut content.experiences, experience, "experience")?
                .description
                .push(String::new())
        }
        ExperienceEdit::RemoveBullet { experience, bullet } => {
            let experience = item_mut(&mut content.experiences, experience, "experience")?;
            remove_at(&mut experience.description, bullet, "bullet")?
        }
        ExperienceEdit::UpdateBullet { experience, bullet, value } => {
            let experience = item_mut(&mut content.experiences, experience, "experience")?;
            replace_at(&mut experience.description, bullet, "bullet", value)?
        }
        ExperienceEdit::AddTechnology { experience } => {
            item_mut(&mut content.experiences, experience, "experience")?
                .technologies
                .push(String::new())
        }
        ExperienceEdit::RemoveTechnology { experience, technology } => {
            let experience = item_mut(&mut content.experiences, experience, "experience")?;
            remove_at(&mut experience.technologies, technology, "technology")?
        }
        ExperienceEdit::UpdateTechnology { experience, technology, value } => {
            let experience = item_mut(&mut content.experiences, experience, "experience")?;
            replace_at(&mut experience.technologies, technology, "technology", value)?
        }
    }
    Ok(())
}

fn apply_contact(edit: ContactEdit, content: &mut ContactContent) -> Result<(), EditError> {
    match edit {
        ContactEdit::SetTitle { value } => content.title = value,
        ContactEdit::SetDescription { value } => content.description = value,
        ContactEdit::SetDetails { value } => content.contact = value,
        ContactEdit::AddLink => content.links.push(ContactLink::default()),
        ContactEdit::RemoveLink { link } => remove_at(&mut content.links, link, "link")?,
        ContactEdit::UpdateLink { link, value } => replace_at(&mut content.links, link, "link", value)?,
        ContactEdit::SetLinkIcon { link, icon } => item_mut(&mut content.links, link, "link")?.icon = icon,
    }
    Ok(())
}
