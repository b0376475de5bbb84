use crate::error::{AppError, Result};

/// A rule table stored on chain as CSV text under its type name.
pub trait TableSheet: Sized {
    const TYPE_NAME: &'static str;

    fn parse(text: &str) -> Result<Self>;
}

/// Header plus rows. Every row has exactly as many cells as the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(table: &str, text: &str) -> Result<Self> {
        let invalid = |reason: String| AppError::InvalidTable {
            table: table.to_string(),
            reason,
        };

        let mut lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| invalid("missing header row".to_string()))?;
        let columns = split_csv_line(header).map_err(|e| invalid(format!("line 1: {}", e)))?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            let cells = split_csv_line(line)
                .map_err(|e| invalid(format!("line {}: {}", index + 1, e)))?;
            if cells.len() != columns.len() {
                return Err(invalid(format!(
                    "line {}: expected {} cells, got {}",
                    index + 1,
                    columns.len(),
                    cells.len()
                )));
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.trim().eq_ignore_ascii_case(name))
    }

    /// First row whose first cell equals `key`.
    pub fn row_by_key(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.first().map(|cell| cell.trim()) == Some(key))
            .map(Vec::as_slice)
    }
}

// Comma separated, double quotes group cells and `""` escapes a quote.
fn split_csv_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => cells.push(std::mem::take(&mut current)),
            (other, _) => current.push(other),
        }
    }

    if in_quotes {
        return Err("unterminated quoted cell".to_string());
    }
    cells.push(current);
    Ok(cells)
}

macro_rules! csv_sheets {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $name(CsvTable);

            impl $name {
                pub fn table(&self) -> &CsvTable {
                    &self.0
                }
            }

            impl TableSheet for $name {
                const TYPE_NAME: &'static str = stringify!($name);

                fn parse(text: &str) -> Result<Self> {
                    CsvTable::parse(Self::TYPE_NAME, text).map(Self)
                }
            }
        )+
    };
}

csv_sheets!(
    MaterialItemSheet,
    SkillSheet,
    SkillBuffSheet,
    StatBuffSheet,
    SkillActionBuffSheet,
    ActionBuffSheet,
    CharacterSheet,
    CharacterLevelSheet,
    EquipmentItemSetEffectSheet,
    CostumeStatSheet,
    WeeklyArenaRewardSheet,
    RuneOptionSheet,
);

/// Base stats of a character row plus per-level growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterStats {
    pub hp: f64,
    pub atk: f64,
    pub def: f64,
    pub lv_hp: f64,
    pub lv_atk: f64,
    pub lv_def: f64,
}

impl CharacterSheet {
    pub fn stats(&self, character_id: i64) -> Option<CharacterStats> {
        let table = self.table();
        let row = table.row_by_key(&character_id.to_string())?;
        let cell = |name: &str| -> f64 {
            table
                .column_index(name)
                .and_then(|i| row.get(i))
                .and_then(|value| value.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        Some(CharacterStats {
            hp: cell("hp"),
            atk: cell("atk"),
            def: cell("def"),
            lv_hp: cell("lv_hp"),
            lv_atk: cell("lv_atk"),
            lv_def: cell("lv_def"),
        })
    }
}

/// The rule tables an arena battle is simulated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaRules {
    pub material_item: MaterialItemSheet,
    pub skill: SkillSheet,
    pub skill_buff: SkillBuffSheet,
    pub stat_buff: StatBuffSheet,
    pub skill_action_buff: SkillActionBuffSheet,
    pub action_buff: ActionBuffSheet,
    pub character: CharacterSheet,
    pub character_level: CharacterLevelSheet,
    pub equipment_item_set_effect: EquipmentItemSetEffectSheet,
    pub costume_stat: CostumeStatSheet,
    pub weekly_arena_reward: WeeklyArenaRewardSheet,
    pub rune_option: RuneOptionSheet,
}

impl ArenaRules {
    pub const TABLE_NAMES: [&'static str; 12] = [
        MaterialItemSheet::TYPE_NAME,
        SkillSheet::TYPE_NAME,
        SkillBuffSheet::TYPE_NAME,
        StatBuffSheet::TYPE_NAME,
        SkillActionBuffSheet::TYPE_NAME,
        ActionBuffSheet::TYPE_NAME,
        CharacterSheet::TYPE_NAME,
        CharacterLevelSheet::TYPE_NAME,
        EquipmentItemSetEffectSheet::TYPE_NAME,
        CostumeStatSheet::TYPE_NAME,
        WeeklyArenaRewardSheet::TYPE_NAME,
        RuneOptionSheet::TYPE_NAME,
    ];

    /// Every table paired with its type name, in `TABLE_NAMES` order.
    pub fn tables(&self) -> [(&'static str, &CsvTable); 12] {
        [
            (MaterialItemSheet::TYPE_NAME, self.material_item.table()),
            (SkillSheet::TYPE_NAME, self.skill.table()),
            (SkillBuffSheet::TYPE_NAME, self.skill_buff.table()),
            (StatBuffSheet::TYPE_NAME, self.stat_buff.table()),
            (SkillActionBuffSheet::TYPE_NAME, self.skill_action_buff.table()),
            (ActionBuffSheet::TYPE_NAME, self.action_buff.table()),
            (CharacterSheet::TYPE_NAME, self.character.table()),
            (CharacterLevelSheet::TYPE_NAME, self.character_level.table()),
            (
                EquipmentItemSetEffectSheet::TYPE_NAME,
                self.equipment_item_set_effect.table(),
            ),
            (CostumeStatSheet::TYPE_NAME, self.costume_stat.table()),
            (WeeklyArenaRewardSheet::TYPE_NAME, self.weekly_arena_reward.table()),
            (RuneOptionSheet::TYPE_NAME, self.rune_option.table()),
        ]
    }

    #[cfg(test)]
    pub fn table(&self, name: &str) -> Option<&CsvTable> {
        self.tables()
            .into_iter()
            .find(|(type_name, _)| *type_name == name)
            .map(|(_, table)| table)
    }
}
