//! Fixed skill vocabulary.
//!
//! The vocabulary drives the fallback matcher and the single-table training
//! variant. Changing it never invalidates a trained index; it only changes
//! which skills the fallback path can report.

use std::collections::HashSet;
use std::path::Path;

use crate::error::SkillError;
use crate::skill::SkillLabel;

/// Built-in vocabulary, grouped by field.
pub const BUILTIN_SKILLS: &[&str] = &[
    // Software & web development
    "HTML", "HTML5", "CSS", "CSS3", "JavaScript", "ES6+", "TypeScript", "React", "Angular",
    "Vue.js", "Svelte", "jQuery", "Webpack", "Babel", "Bootstrap", "Tailwind CSS", "Sass",
    "LESS", "Node.js", "Express", "Express.js", "Python", "Django", "Flask", "Java", "Spring",
    "C#", ".NET", "C++", "Ruby", "Ruby on Rails", "PHP", "Laravel", "Go", "REST APIs",
    "GraphQL", "Swift", "iOS Development", "Kotlin", "Android Development", "React Native",
    "Flutter", "SQL", "PostgreSQL", "MySQL", "Microsoft SQL Server", "Oracle", "NoSQL",
    "MongoDB", "Redis", "Cassandra", "Firebase", "DynamoDB", "AWS", "Azure",
    "Microsoft Azure", "Google Cloud Platform (GCP)", "Docker", "Kubernetes", "CI/CD",
    "Jenkins", "GitLab CI", "GitHub Actions", "CircleCI", "Terraform", "Ansible", "Chef",
    "Puppet", "WordPress", "Drupal", "Joomla", "Shopify", "Magento", "Jest", "Mocha",
    "Cypress", "Selenium", "JUnit", "PyTest", "Git", "GitHub", "GitLab", "Bitbucket",
    // Data science & analytics
    "Pandas", "NumPy", "Scikit-learn", "R", "Machine Learning", "TensorFlow", "PyTorch",
    "Keras", "NLP", "Natural Language Processing (NLP)", "Computer Vision",
    "Data Visualization", "Tableau", "Power BI", "D3.js", "Matplotlib", "Seaborn",
    "Big Data", "Hadoop", "Spark", "Kafka", "Data Warehousing", "Snowflake", "Redshift",
    "BigQuery", "Data Analysis",
    // IT & security
    "Network Administration", "TCP/IP", "DNS", "DHCP", "System Administration", "Linux",
    "Windows Server", "Cybersecurity", "Penetration Testing", "SIEM", "Firewalls",
    "Ethical Hacking", "Cloud Security", "IT Support", "Help Desk",
    // Management & operations
    "Project Management", "Agile", "Scrum", "Waterfall", "Product Management",
    "Business Development", "Operations Management", "Supply Chain Management", "Logistics",
    "Risk Management", "Quality Assurance (QA)", "Human Resources (HR)", "Recruiting",
    "Talent Acquisition", "Jira",
    // Finance & accounting
    "Financial Analysis", "Financial Modeling", "Accounting", "GAAP", "IFRS", "Bookkeeping",
    "QuickBooks", "Xero", "Auditing", "Tax Preparation", "Payroll Management", "Forecasting",
    "Budgeting", "Investment Management",
    // Sales & marketing
    "Digital Marketing", "Search Engine Optimization (SEO)", "Search Engine Marketing (SEM)",
    "Pay-Per-Click (PPC)", "Content Marketing", "Social Media Marketing (SMM)",
    "Email Marketing", "Google Analytics", "Adobe Analytics", "Sales", "Lead Generation",
    "CRM", "Salesforce", "HubSpot", "Negotiation", "B2B Sales", "B2C Sales",
    "Market Research", "Brand Management", "Public Relations (PR)",
    // Creative & design
    "Graphic Design", "Adobe Photoshop", "Adobe Illustrator", "Adobe InDesign", "Figma",
    "Sketch", "Canva", "UI/UX Design", "User Research", "Wireframing", "Prototyping",
    "Usability Testing", "Copywriting", "Editing", "Blogging", "Podcasting", "Grant Writing",
    "Video Editing", "Adobe Premiere Pro", "Final Cut Pro", "Motion Graphics",
    "Adobe After Effects", "Photography", "Digital Photography", "Lighting", "Photo Editing",
    // Retail & customer service
    "Point of Sale (POS) Systems", "Customer Relationship Management (CRM)",
    "Inventory Management", "Visual Merchandising", "Loss Prevention", "Conflict Resolution",
    "Clienteling", "Customer Service",
    // Real estate
    "Real Estate Law", "Real Estate License", "Property Management", "Real Estate Appraisal",
    "Leasing", "Contract Negotiation", "MLS (Multiple Listing Service)",
    // Healthcare
    "Electronic Health Records (EHR)", "EMR", "Medical Billing", "Medical Coding",
    "Patient Care", "Patient Scheduling", "HIPAA Compliance", "Phlebotomy", "Pharmacology",
    // Trades
    "Carpentry", "Plumbing", "Electrical Work", "Wiring", "Welding", "HVAC Systems",
    "Automotive Repair", "Forklift Operation", "Food Safety", "Food Handling",
    // Soft skills
    "Communication", "Verbal Communication", "Written Communication", "Public Speaking",
    "Active Listening", "Leadership", "Team Leadership", "Mentoring", "Decision Making",
    "Strategic Planning", "Teamwork", "Collaboration", "Interpersonal Skills", "Empathy",
    "Problem-Solving", "Critical Thinking", "Analytical Skills", "Creativity",
    "Time Management", "Organization", "Adaptability", "Reliability", "Attention to Detail",
    "Work Ethic",
];

/// An ordered, de-duplicated list of known skills.
///
/// Entries keep their display form ("C++", "Node.js"); `labels()` yields the
/// normalized form used everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary, dropping blanks and entries whose label repeats.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(SkillLabel::new(s)))
            .collect();
        Self { entries }
    }

    /// The compiled-in vocabulary.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SKILLS.iter().copied())
    }

    /// Load a vocabulary from a JSON array of strings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkillError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let entries: Vec<String> = serde_json::from_slice(&bytes)?;
        let vocab = Self::new(entries);
        if vocab.is_empty() {
            return Err(SkillError::InvalidInput(format!(
                "vocabulary {} has no entries",
                path.display()
            )));
        }
        Ok(vocab)
    }

    /// Load from `path` when given, otherwise use the built-in list.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, SkillError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = SkillLabel> + '_ {
        self.entries.iter().map(SkillLabel::new)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}
